// ==========================================
// 配方成本核算系统 - 文件解析器实现
// ==========================================
// 支持: Excel (.xlsx) / CSV (.csv)
// 列顺序固定: ID | PRODUCTO | PRECIO | UNIDAD（按位置读取，不依赖表头文字）
// 行号: 表格行号（表头为第 1 行）
// ==========================================

use crate::domain::import::{RawRow, FIRST_DATA_ROW};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::price_importer_trait::FileParser;
use calamine::{open_workbook, Data, Range, Reader, Xlsx};
use csv::ReaderBuilder;
use std::fs::File;
use std::io::{Cursor, Read, Seek};
use std::path::Path;

// 按列位置取值，缺失列视为空
fn cell_at(cells: &[String], idx: usize) -> String {
    cells.get(idx).map(|c| c.trim().to_string()).unwrap_or_default()
}

fn row_from_cells(row_number: usize, cells: &[String]) -> Option<RawRow> {
    // 跳过完全空白的行
    if cells.iter().all(|c| c.trim().is_empty()) {
        return None;
    }
    Some(RawRow::new(
        row_number,
        cell_at(cells, 0),
        cell_at(cells, 1),
        cell_at(cells, 2),
        cell_at(cells, 3),
    ))
}

fn check_exists(path: &Path) -> ImportResult<()> {
    if !path.exists() {
        return Err(ImportError::FileNotFound(path.display().to_string()));
    }
    Ok(())
}

fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
}

// ==========================================
// CSV Parser 实现
// ==========================================
pub struct CsvParser;

impl CsvParser {
    /// 从任意读取器解析（表头行固定跳过）
    pub fn parse_reader<R: Read>(&self, reader: R) -> ImportResult<Vec<RawRow>> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true) // 允许行长度不一致
            .from_reader(reader);

        let mut rows = Vec::new();
        for (idx, result) in reader.records().enumerate() {
            let record = result?;
            let row_number = record
                .position()
                .map(|p| p.line() as usize)
                .unwrap_or(idx + FIRST_DATA_ROW);
            let cells: Vec<String> = record.iter().map(|v| v.to_string()).collect();

            if let Some(row) = row_from_cells(row_number, &cells) {
                rows.push(row);
            }
        }

        Ok(rows)
    }
}

impl FileParser for CsvParser {
    fn parse_rows(&self, file_path: &Path) -> ImportResult<Vec<RawRow>> {
        check_exists(file_path)?;

        let ext = extension_of(file_path);
        if ext != "csv" {
            return Err(ImportError::UnsupportedFormat(ext));
        }

        let file = File::open(file_path)?;
        self.parse_reader(file)
    }
}

// ==========================================
// Excel Parser 实现
// ==========================================
pub struct ExcelParser;

impl ExcelParser {
    /// 从内存字节解析（远程下载场景）
    pub fn parse_bytes(&self, bytes: &[u8]) -> ImportResult<Vec<RawRow>> {
        let workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes.to_vec()))?;
        self.parse_workbook(workbook)
    }

    fn parse_workbook<RS: Read + Seek>(&self, mut workbook: Xlsx<RS>) -> ImportResult<Vec<RawRow>> {
        // 读取第一个 sheet
        let sheet_name = workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| ImportError::ExcelParseError("Excel 文件无工作表".to_string()))?;

        let range = workbook.worksheet_range(&sheet_name)?;
        Ok(rows_from_range(&range))
    }
}

// 表头为区域首行；区域可能不从 A1 开始，行号按绝对位置计算
fn rows_from_range(range: &Range<Data>) -> Vec<RawRow> {
    let start_row = range.start().map(|(row, _)| row as usize).unwrap_or(0);

    range
        .rows()
        .enumerate()
        .skip(1)
        .filter_map(|(offset, cells)| {
            let cells: Vec<String> = cells.iter().map(|cell| cell.to_string()).collect();
            row_from_cells(start_row + offset + 1, &cells)
        })
        .collect()
}

impl FileParser for ExcelParser {
    fn parse_rows(&self, file_path: &Path) -> ImportResult<Vec<RawRow>> {
        check_exists(file_path)?;

        let ext = extension_of(file_path);
        if ext != "xlsx" {
            return Err(ImportError::UnsupportedFormat(ext));
        }

        let workbook: Xlsx<_> = open_workbook(file_path)?;
        self.parse_workbook(workbook)
    }
}

// ==========================================
// 通用文件解析器（根据扩展名自动选择）
// ==========================================
pub struct UniversalFileParser;

impl FileParser for UniversalFileParser {
    fn parse_rows(&self, file_path: &Path) -> ImportResult<Vec<RawRow>> {
        match extension_of(file_path).as_str() {
            "csv" => CsvParser.parse_rows(file_path),
            "xlsx" => ExcelParser.parse_rows(file_path),
            other => Err(ImportError::UnsupportedFormat(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    fn csv_file(lines: &[&str]) -> tempfile::NamedTempFile {
        let mut temp_file = Builder::new().suffix(".csv").tempfile().unwrap();
        for line in lines {
            writeln!(temp_file, "{}", line).unwrap();
        }
        temp_file
    }

    #[test]
    fn test_csv_parser_reads_fixed_columns() {
        let temp_file = csv_file(&[
            "ID,PRODUCTO,PRECIO,UNIDAD",
            "A1,Harina,10.5,kilogram",
            "A2, Azucar ,12,gram",
        ]);

        let rows = CsvParser.parse_rows(temp_file.path()).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], RawRow::new(2, "A1", "Harina", "10.5", "kilogram"));
        assert_eq!(rows[1].product, "Azucar");
        assert_eq!(rows[1].row_number, 3);
    }

    #[test]
    fn test_csv_parser_skips_blank_rows_and_keeps_row_numbers() {
        let temp_file = csv_file(&[
            "ID,PRODUCTO,PRECIO,UNIDAD",
            "A1,Harina,10,kilogram",
            ",,,",
            "A3,Sal,2",
        ]);

        let rows = CsvParser.parse_rows(temp_file.path()).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].row_number, 4);
        // 缺失列视为空
        assert_eq!(rows[1].unit, "");
    }

    #[test]
    fn test_csv_parser_file_not_found() {
        let result = CsvParser.parse_rows(Path::new("no_existe.csv"));
        assert!(matches!(result, Err(ImportError::FileNotFound(_))));
    }

    #[test]
    fn test_universal_parser_rejects_unknown_extension() {
        let temp_file = Builder::new().suffix(".txt").tempfile().unwrap();
        let result = UniversalFileParser.parse_rows(temp_file.path());
        assert!(matches!(result, Err(ImportError::UnsupportedFormat(ext)) if ext == "txt"));
    }

    #[test]
    fn test_excel_parser_rejects_garbage_bytes() {
        let result = ExcelParser.parse_bytes(b"not a workbook");
        assert!(matches!(result, Err(ImportError::ExcelParseError(_))));
    }
}
