// ==========================================
// 配方成本核算系统 - 单位目录
// ==========================================
// 职责: 支持的计量单位注册表（按分类组织）
// 红线: 纯查询，无副作用；进程启动后只读
// 约定: 单位代码比较不区分大小写（统一 trim + 小写后作为键）
// ==========================================

use crate::domain::unit::{UnitCategory, UnitInfo};
use once_cell::sync::Lazy;
use std::collections::HashMap;

const MASS: &[UnitInfo] = &[
    UnitInfo::new("kilogram", "Kilogramo", "kg"),
    UnitInfo::new("gram", "Gramo", "g"),
    UnitInfo::new("pound", "Libra", "lb"),
    UnitInfo::new("ounce", "Onza", "oz"),
    UnitInfo::new("ounce (gold)", "Onza (oro)", "oz"),
    UnitInfo::new("tonne", "Tonelada", "ton"),
    UnitInfo::new("ton (UK)", "Tonelada (UK)", "ton"),
    UnitInfo::new("ton (US)", "Tonelada (US)", "ton"),
    UnitInfo::new("carat", "Quilate", "ct"),
    UnitInfo::new("carat (UK)", "Quilate (UK)", "ct"),
    UnitInfo::new("stone", "Stone", "st"),
    UnitInfo::new("mace (China)", "Mace (China)", ""),
    UnitInfo::new("tael (China)", "Tael (China)", ""),
    UnitInfo::new("catty (China)", "Catty (China)", ""),
    UnitInfo::new("mace (HK)", "Mace (HK)", ""),
    UnitInfo::new("tael (HK)", "Tael (HK)", ""),
    UnitInfo::new("catty (HK)", "Catty (HK)", ""),
    UnitInfo::new("tam (HK)", "Tam (HK)", ""),
    UnitInfo::new("tael (Taiwan)", "Tael (Taiwan)", ""),
    UnitInfo::new("catty (Taiwan)", "Catty (Taiwan)", ""),
    UnitInfo::new("catty (Japan)", "Catty (Japan)", ""),
    UnitInfo::new("dan (Japan)", "Dan (Japan)", ""),
    UnitInfo::new("artel (Arab)", "Artel (Árabe)", ""),
    UnitInfo::new("baht (Thai)", "Baht (Tailandés)", ""),
    UnitInfo::new("bale (UK)", "Bale (UK)", ""),
    UnitInfo::new("bale (US)", "Bale (US)", ""),
    UnitInfo::new("denier (France)", "Denier (Francia)", ""),
    UnitInfo::new("centner (Germany)", "Centner (Alemania)", ""),
    UnitInfo::new("gran (Germany)", "Gran (Alemania)", ""),
    UnitInfo::new("lot (Germany)", "Lot (Alemania)", ""),
    UnitInfo::new("centner (Russia)", "Centner (Rusia)", ""),
    UnitInfo::new("danaro (Italy)", "Danaro (Italia)", ""),
    UnitInfo::new("etto (Italy)", "Etto (Italia)", ""),
    UnitInfo::new("grano (Italy)", "Grano (Italia)", ""),
    UnitInfo::new("Arroba (Portugal)", "Arroba (Portugal)", ""),
    UnitInfo::new("funt (Russia)", "Funt (Rusia)", ""),
];

const LENGTH: &[UnitInfo] = &[
    UnitInfo::new("kilometer", "Kilómetro", "km"),
    UnitInfo::new("meter", "Metro", "m"),
    UnitInfo::new("centimeter", "Centímetro", "cm"),
    UnitInfo::new("millimeter", "Milímetro", "mm"),
    UnitInfo::new("inch", "Pulgada", "inch"),
    UnitInfo::new("feet", "Pie", "ft"),
    UnitInfo::new("yard", "Yarda", "yd"),
    UnitInfo::new("mile", "Milla", "mi"),
    UnitInfo::new("fen (Taiwan)", "Fen (Taiwan)", ""),
    UnitInfo::new("inch (Taiwan)", "Pulgada (Taiwan)", ""),
    UnitInfo::new("feet (Taiwan)", "Pie (Taiwan)", ""),
    UnitInfo::new("jian (Taiwan)", "Jian (Taiwan)", ""),
    UnitInfo::new("inch (Japan)", "Pulgada (Japón)", ""),
    UnitInfo::new("feet (Japan)", "Pie (Japón)", ""),
    UnitInfo::new("jian (Japan)", "Jian (Japón)", ""),
    UnitInfo::new("zhang (Japan)", "Zhang (Japón)", ""),
    UnitInfo::new("ding (Japan)", "Ding (Japón)", ""),
    UnitInfo::new("li (Japan)", "Li (Japón)", ""),
];

const AREA: &[UnitInfo] = &[
    UnitInfo::new("sq meter", "Metro cuadrado", "m²"),
    UnitInfo::new("sq inch", "Pulgada cuadrada", "inch²"),
    UnitInfo::new("sq feet", "Pie cuadrado", "ft²"),
    UnitInfo::new("sq yard", "Yarda cuadrada", "yd²"),
    UnitInfo::new("sq kilometer", "Kilómetro cuadrado", "km²"),
    UnitInfo::new("acre", "Acre", "ac"),
    UnitInfo::new("hectare", "Hectárea", "ha"),
    UnitInfo::new("ping (Taiwan)", "Ping (Taiwan)", ""),
    UnitInfo::new("fen (Taiwan)", "Fen (Taiwan)", ""),
    UnitInfo::new("jia (Taiwan)", "Jia (Taiwan)", ""),
    UnitInfo::new("mu (China)", "Mu (China)", ""),
];

const VOLUME: &[UnitInfo] = &[
    UnitInfo::new("liter", "Litro", "l"),
    UnitInfo::new("cu mm", "Milímetro cúbico", "mm³"),
    UnitInfo::new("milliliter", "Mililitro", "ml"),
    UnitInfo::new("cu cm", "Centímetro cúbico", "cc"),
    UnitInfo::new("cu meter", "Metro cúbico", "m³"),
    UnitInfo::new("cu inch", "Pulgada cúbica", "inch³"),
    UnitInfo::new("cu feet", "Pie cúbico", "ft³"),
    UnitInfo::new("ounce (US)", "Onza (US)", "oz"),
    UnitInfo::new("pint (US)", "Pinta (US)", "pt"),
    UnitInfo::new("ounce (UK)", "Onza (UK)", "oz"),
    UnitInfo::new("pint (UK)", "Pinta (UK)", "pt"),
    UnitInfo::new("gallon", "Galón", "gal"),
];

const TEMPERATURE: &[UnitInfo] = &[
    UnitInfo::new("Celsius", "Celsius", "°C"),
    UnitInfo::new("Fahrenheit", "Fahrenheit", "°F"),
    UnitInfo::new("Kelvin", "Kelvin", "K"),
];

const SPEED: &[UnitInfo] = &[
    UnitInfo::new("meter/s", "Metro por segundo", "m/s"),
    UnitInfo::new("foot/s", "Pie por segundo", "ft/s"),
    UnitInfo::new("inch/s", "Pulgada por segundo", "in/s"),
    UnitInfo::new("km/s", "Kilómetro por segundo", "km/s"),
    UnitInfo::new("km/min", "Kilómetro por minuto", "km/min"),
    UnitInfo::new("km/hour", "Kilómetro por hora", "km/h"),
    UnitInfo::new("meter/min", "Metro por minuto", "m/min"),
    UnitInfo::new("mile/s", "Milla por segundo", "ml/s"),
    UnitInfo::new("mile/min", "Milla por minuto", "ml/min"),
    UnitInfo::new("mile/hour", "Milla por hora", "mph"),
];

const FUEL: &[UnitInfo] = &[
    UnitInfo::new("km/gal", "Kilómetro por galón", "km/gal"),
    UnitInfo::new("km/l", "Kilómetro por litro", "km/l"),
    UnitInfo::new("ml/l (US)", "Milla por litro (US)", "ml/l"),
    UnitInfo::new("mi/gal (US)", "Milla por galón (US)", "mi/gal"),
    UnitInfo::new("mi/gal (UK)", "Milla por galón (UK)", "mi/gal"),
];

const PRESSURE: &[UnitInfo] = &[
    UnitInfo::new("atm pressure", "Atmósfera", "atm"),
    UnitInfo::new("Pascal", "Pascal", "Pa"),
    UnitInfo::new("psi", "PSI", "psi"),
    UnitInfo::new("psf", "PSF", "psf"),
];

const CATEGORIES: &[UnitCategory] = &[
    UnitCategory { name: "Peso", units: MASS },
    UnitCategory { name: "Longitud", units: LENGTH },
    UnitCategory { name: "Área", units: AREA },
    UnitCategory { name: "Volumen", units: VOLUME },
    UnitCategory { name: "Temperatura", units: TEMPERATURE },
    UnitCategory { name: "Velocidad", units: SPEED },
    UnitCategory { name: "Combustible", units: FUEL },
    UnitCategory { name: "Presión", units: PRESSURE },
];

// 规范化代码 → 单位信息；同一代码出现在多个分类时，先出现者生效
static UNIT_INDEX: Lazy<HashMap<String, &'static UnitInfo>> = Lazy::new(|| {
    let mut index = HashMap::new();
    for category in CATEGORIES {
        for unit in category.units {
            index.entry(normalize_unit_code(unit.api_code)).or_insert(unit);
        }
    }
    index
});

/// 单位代码规范化（trim + 小写）
pub fn normalize_unit_code(code: &str) -> String {
    code.trim().to_lowercase()
}

// ==========================================
// UnitCatalog - 单位目录（无状态句柄，共享同一份静态数据）
// ==========================================
#[derive(Debug, Clone, Copy, Default)]
pub struct UnitCatalog;

impl UnitCatalog {
    pub fn new() -> Self {
        Self
    }

    /// 按分类组织的完整目录（顺序固定）
    pub fn categories(&self) -> &'static [UnitCategory] {
        CATEGORIES
    }

    /// 单位是否在目录内（不区分大小写，空白视为无效）
    pub fn is_valid_unit(&self, code: &str) -> bool {
        self.get_unit_info(code).is_some()
    }

    /// 查询单位信息
    pub fn get_unit_info(&self, code: &str) -> Option<&'static UnitInfo> {
        let key = normalize_unit_code(code);
        if key.is_empty() {
            return None;
        }
        UNIT_INDEX.get(&key).copied()
    }

    /// 目录中的规范拼写（如 "CELSIUS" → "Celsius"）
    pub fn canonical_code(&self, code: &str) -> Option<&'static str> {
        self.get_unit_info(code).map(|info| info.api_code)
    }

    /// 全部有效单位代码（去重，按字母序）
    pub fn valid_units(&self) -> Vec<&'static str> {
        let mut codes: Vec<&'static str> = UNIT_INDEX.values().map(|u| u.api_code).collect();
        codes.sort_unstable_by_key(|code| code.to_lowercase());
        codes
    }
}
