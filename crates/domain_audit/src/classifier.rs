//! Line-item code classification
//!
//! Maps estimating-system codes and free-form descriptions to semantic tags:
//! trade categories, drying equipment, flooring operations and materials.
//! The classifier also owns the catalog of double-dip pattern pairs used by
//! the overlap checks.
//!
//! # Matching policy
//!
//! A recognised code prefix (`WTR_`, `FCC_`, ...) is authoritative for the
//! trade category. When the code is blank or carries no recognised prefix,
//! the description patterns decide, and several categories may match.
//! Attribute patterns are tested against the code first and then against
//! the description. Items that match no category are UNKNOWN.
//!
//! # Example
//!
//! ```rust,ignore
//! let classifier = CodeClassifier::shared()?;
//! let class = classifier.classify("WTR_AIRF", "Air Mover");
//! assert!(class.has_category(TradeCategory::Water));
//! assert_eq!(class.equipment, Some(EquipmentKind::AirMover));
//! ```

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use domain_claims::LineItem;
use crate::error::AuditError;
use crate::taxonomy::AuditDomain;

/// Version of the built-in pattern catalog
pub const CATALOG_VERSION: &str = "2024.2";

static SHARED: Lazy<Result<Arc<CodeClassifier>, AuditError>> =
    Lazy::new(|| CodeClassifier::standard().map(Arc::new));

/// Trade category of a line item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeCategory {
    Water,
    Drying,
    FlooringCarpet,
    FlooringNatural,
    Painting,
    Cleaning,
    Demolition,
    Contents,
    General,
}

impl TradeCategory {
    pub const ALL: [TradeCategory; 9] = [
        TradeCategory::Water,
        TradeCategory::Drying,
        TradeCategory::FlooringCarpet,
        TradeCategory::FlooringNatural,
        TradeCategory::Painting,
        TradeCategory::Cleaning,
        TradeCategory::Demolition,
        TradeCategory::Contents,
        TradeCategory::General,
    ];

    /// Stable lowercase key, also used for sub-limit lookup
    pub fn key(&self) -> &'static str {
        match self {
            TradeCategory::Water => "water",
            TradeCategory::Drying => "drying",
            TradeCategory::FlooringCarpet => "flooring_carpet",
            TradeCategory::FlooringNatural => "flooring_natural",
            TradeCategory::Painting => "painting",
            TradeCategory::Cleaning => "cleaning",
            TradeCategory::Demolition => "demolition",
            TradeCategory::Contents => "contents",
            TradeCategory::General => "general",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        let key = key.trim().to_lowercase();
        Self::ALL.into_iter().find(|c| c.key() == key)
    }

    /// Estimating-system code prefix
    pub fn code_prefix(&self) -> &'static str {
        match self {
            TradeCategory::Water => "WTR",
            TradeCategory::Drying => "DRY",
            TradeCategory::FlooringCarpet => "FCC",
            TradeCategory::FlooringNatural => "FNC",
            TradeCategory::Painting => "PNT",
            TradeCategory::Cleaning => "CLN",
            TradeCategory::Demolition => "DEM",
            TradeCategory::Contents => "CNT",
            TradeCategory::General => "GEN",
        }
    }

    fn description_pattern(&self) -> &'static str {
        match self {
            TradeCategory::Water => r"\bWATER\b|\bEXTRACT|\bFLOOD",
            TradeCategory::Drying => r"\bDRY(?:ING|OUT)?\b|\bDEHU|AIR\s*MOVER|AIR\s*SCRUB|\bHEPA\b",
            TradeCategory::FlooringCarpet => r"CARPET|(?:^|[^A-Za-z])PAD(?:[^A-Za-z]|$)",
            TradeCategory::FlooringNatural => r"HARDWOOD|\bTILE\b|LAMINATE|VINYL|\bLVP\b|\bLVT\b",
            TradeCategory::Painting => r"\bPAINT|\bPRIME[RD]?\b|\bSEAL(?:ER)?\b",
            TradeCategory::Cleaning => r"\bCLEAN",
            TradeCategory::Demolition => r"\bDEMO|HAUL\s*-?\s*OFF|\bDEBRIS\b|DUMPSTER",
            TradeCategory::Contents => r"\bCONTENTS?\b|PACK\s*-?\s*OUT",
            TradeCategory::General => r"\bDOORS?\b|\bHINGE|MOLDING|DRYWALL|WALLBOARD|\bTRIM\b|LABOR\s*MIN",
        }
    }
}

impl fmt::Display for TradeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Rented drying equipment, billed per unit per day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EquipmentKind {
    AirMover,
    Dehumidifier,
    AirScrubber,
}

impl EquipmentKind {
    pub const ALL: [EquipmentKind; 3] = [
        EquipmentKind::AirMover,
        EquipmentKind::Dehumidifier,
        EquipmentKind::AirScrubber,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            EquipmentKind::AirMover => "Air Mover",
            EquipmentKind::Dehumidifier => "Dehumidifier",
            EquipmentKind::AirScrubber => "Air Scrubber",
        }
    }

    fn pattern(&self) -> &'static str {
        match self {
            EquipmentKind::AirMover => r"AIR\s*MOVER|AIR_?F|(?:^|[_\s])FAN(?:[_\s]|$)",
            EquipmentKind::Dehumidifier => r"DEHU|(?:^|[_\s])DH\d*(?:[_\s]|$)",
            EquipmentKind::AirScrubber => r"AIR\s*SCRUB|\bHEPA\b|NEG(?:ATIVE)?\s*AIR",
        }
    }
}

/// Flooring work performed by a line item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlooringOperation {
    TearOut,
    Install,
    Leveling,
    Waste,
}

impl FlooringOperation {
    pub const ALL: [FlooringOperation; 4] = [
        FlooringOperation::TearOut,
        FlooringOperation::Install,
        FlooringOperation::Leveling,
        FlooringOperation::Waste,
    ];

    fn pattern(&self) -> &'static str {
        match self {
            FlooringOperation::TearOut => {
                r"TEAR\s*-?\s*OUT|REMOV|R\s*&\s*R|REM$|(?:^|[_\s])REM(?:[_\s]|$)|\bDEMO"
            }
            FlooringOperation::Install => r"INSTALL|INST$|(?:^|[_\s])INST(?:[_\s]|$)|\bLAY\b",
            FlooringOperation::Leveling => r"LEVEL|\bFLOAT\b|UNDERLAY|FLOOR\s*PREP|\bPREP\b",
            FlooringOperation::Waste => r"WASTE|CUT\s*-?\s*OFF|OVERAGE",
        }
    }
}

/// Flooring material named by a line item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlooringMaterial {
    Carpet,
    Pad,
    Hardwood,
    Tile,
    Vinyl,
    Laminate,
}

impl FlooringMaterial {
    pub const ALL: [FlooringMaterial; 6] = [
        FlooringMaterial::Carpet,
        FlooringMaterial::Pad,
        FlooringMaterial::Hardwood,
        FlooringMaterial::Tile,
        FlooringMaterial::Vinyl,
        FlooringMaterial::Laminate,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            FlooringMaterial::Carpet => "carpet",
            FlooringMaterial::Pad => "pad",
            FlooringMaterial::Hardwood => "hardwood",
            FlooringMaterial::Tile => "tile",
            FlooringMaterial::Vinyl => "vinyl",
            FlooringMaterial::Laminate => "laminate",
        }
    }

    fn pattern(&self) -> &'static str {
        match self {
            FlooringMaterial::Carpet => r"CARPET|CPT|CRPT",
            FlooringMaterial::Pad => r"(?:^|[^A-Za-z])PAD",
            FlooringMaterial::Hardwood => r"HARDWOOD|HWD|WOOD\s*FLOOR",
            FlooringMaterial::Tile => r"TILE|CERAMIC|PORCELAIN",
            FlooringMaterial::Vinyl => r"VINYL|\bLVP\b|\bLVT\b|\bVCT\b",
            FlooringMaterial::Laminate => r"LAMINATE|\bLAM\b",
        }
    }
}

/// A compiled, case-insensitive catalog pattern
#[derive(Debug, Clone)]
pub struct Pattern {
    regex: Regex,
}

impl Pattern {
    /// Compiles a pattern; matching is always case-insensitive
    pub fn new(source: &str) -> Result<Self, AuditError> {
        Regex::new(&format!("(?i){source}"))
            .map(|regex| Self { regex })
            .map_err(|source_err| AuditError::Pattern {
                pattern: source.to_string(),
                source: source_err,
            })
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }

    /// Tests the code first, then the description
    pub fn matches_item(&self, code: &str, description: &str) -> bool {
        (!code.is_empty() && self.regex.is_match(code)) || self.regex.is_match(description)
    }

    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }
}

/// One side of a double-dip pair
#[derive(Debug, Clone)]
pub struct PairSide {
    all_of: Vec<Pattern>,
    none_of: Vec<Pattern>,
}

impl PairSide {
    pub fn new(all_of: &[&str], none_of: &[&str]) -> Result<Self, AuditError> {
        Ok(Self {
            all_of: all_of.iter().map(|p| Pattern::new(p)).collect::<Result<_, _>>()?,
            none_of: none_of.iter().map(|p| Pattern::new(p)).collect::<Result<_, _>>()?,
        })
    }

    pub fn matches(&self, code: &str, description: &str) -> bool {
        !self.all_of.is_empty()
            && self.all_of.iter().all(|p| p.matches_item(code, description))
            && !self.none_of.iter().any(|p| p.matches_item(code, description))
    }
}

/// Which pair side holds the work already included in the other
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PairSideKind {
    First,
    Second,
}

/// Where the two sides of a pair must be billed to overlap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PairScope {
    /// Same room; unscoped items follow the overlap policy
    Room,
    /// Anywhere on the claim
    Claim,
}

/// Two individually legitimate items that duplicate each other when billed together
#[derive(Debug, Clone)]
pub struct DoubleDipPair {
    pub id: String,
    pub label: String,
    pub domain: AuditDomain,
    pub scope: PairScope,
    pub first: PairSide,
    pub second: PairSide,
    /// Side whose cost is already included in the other
    pub redundant: PairSideKind,
    pub recommendation: String,
}

impl DoubleDipPair {
    /// Side of the pair matched by an item; the first side wins ties
    pub fn side_of(&self, code: &str, description: &str) -> Option<PairSideKind> {
        if self.first.matches(code, description) {
            Some(PairSideKind::First)
        } else if self.second.matches(code, description) {
            Some(PairSideKind::Second)
        } else {
            None
        }
    }
}

/// Result of classifying one line item
///
/// Confidence is binary: a tag is either matched or absent.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ClassifiedCode {
    pub categories: BTreeSet<TradeCategory>,
    pub equipment: Option<EquipmentKind>,
    pub operations: BTreeSet<FlooringOperation>,
    pub materials: BTreeSet<FlooringMaterial>,
}

impl ClassifiedCode {
    /// No trade category matched
    pub fn is_unknown(&self) -> bool {
        self.categories.is_empty()
    }

    pub fn has_category(&self, category: TradeCategory) -> bool {
        self.categories.contains(&category)
    }

    pub fn has_any_category(&self, categories: &[TradeCategory]) -> bool {
        categories.iter().any(|c| self.categories.contains(c))
    }

    pub fn has_operation(&self, operation: FlooringOperation) -> bool {
        self.operations.contains(&operation)
    }

    pub fn has_material(&self, material: FlooringMaterial) -> bool {
        self.materials.contains(&material)
    }

    pub fn is_flooring(&self) -> bool {
        self.has_any_category(&[TradeCategory::FlooringCarpet, TradeCategory::FlooringNatural])
    }

    pub fn is_equipment(&self) -> bool {
        self.equipment.is_some()
    }
}

#[derive(Clone)]
struct CategoryPatterns {
    category: TradeCategory,
    code: Pattern,
    description: Pattern,
}

/// Immutable pattern catalog shared by every validator
#[derive(Debug, Clone)]
pub struct CodeClassifier {
    version: String,
    categories: Vec<CategoryPatterns>,
    equipment: Vec<(EquipmentKind, Pattern)>,
    operations: Vec<(FlooringOperation, Pattern)>,
    materials: Vec<(FlooringMaterial, Pattern)>,
    pairs: Vec<DoubleDipPair>,
}

impl fmt::Debug for CategoryPatterns {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CategoryPatterns")
            .field("category", &self.category)
            .finish()
    }
}

impl CodeClassifier {
    /// Builds the classifier from the built-in catalog
    pub fn standard() -> Result<Self, AuditError> {
        let categories = TradeCategory::ALL
            .iter()
            .map(|category| {
                Ok(CategoryPatterns {
                    category: *category,
                    code: Pattern::new(&format!("^{}(?:[^A-Za-z]|$)", category.code_prefix()))?,
                    description: Pattern::new(category.description_pattern())?,
                })
            })
            .collect::<Result<Vec<_>, AuditError>>()?;

        let equipment = EquipmentKind::ALL
            .iter()
            .map(|kind| Ok((*kind, Pattern::new(kind.pattern())?)))
            .collect::<Result<Vec<_>, AuditError>>()?;
        let operations = FlooringOperation::ALL
            .iter()
            .map(|op| Ok((*op, Pattern::new(op.pattern())?)))
            .collect::<Result<Vec<_>, AuditError>>()?;
        let materials = FlooringMaterial::ALL
            .iter()
            .map(|m| Ok((*m, Pattern::new(m.pattern())?)))
            .collect::<Result<Vec<_>, AuditError>>()?;

        Ok(Self {
            version: CATALOG_VERSION.to_string(),
            categories,
            equipment,
            operations,
            materials,
            pairs: standard_pairs()?,
        })
    }

    /// Process-wide classifier built from the standard catalog on first use
    pub fn shared() -> Result<Arc<CodeClassifier>, AuditError> {
        SHARED
            .as_ref()
            .map(Arc::clone)
            .map_err(|e| AuditError::configuration(format!("built-in pattern catalog: {e}")))
    }

    /// Adds a double-dip pair at construction time
    pub fn with_pair(mut self, pair: DoubleDipPair) -> Self {
        self.pairs.push(pair);
        self
    }

    /// Tags the catalog with a custom version label
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Classifies a code/description pair
    pub fn classify(&self, code: &str, description: &str) -> ClassifiedCode {
        let code = code.trim();
        let description = description.trim();

        let by_code: BTreeSet<TradeCategory> = self
            .categories
            .iter()
            .filter(|c| !code.is_empty() && c.code.is_match(code))
            .map(|c| c.category)
            .collect();
        let categories = if by_code.is_empty() {
            self.categories
                .iter()
                .filter(|c| c.description.is_match(description))
                .map(|c| c.category)
                .collect()
        } else {
            by_code
        };

        let drying_context = categories.contains(&TradeCategory::Water)
            || categories.contains(&TradeCategory::Drying);
        let equipment = if drying_context {
            self.equipment
                .iter()
                .find(|(_, p)| p.matches_item(code, description))
                .map(|(kind, _)| *kind)
        } else {
            None
        };

        let operations = self
            .operations
            .iter()
            .filter(|(_, p)| p.matches_item(code, description))
            .map(|(op, _)| *op)
            .collect();
        let materials = self
            .materials
            .iter()
            .filter(|(_, p)| p.matches_item(code, description))
            .map(|(m, _)| *m)
            .collect();

        ClassifiedCode {
            categories,
            equipment,
            operations,
            materials,
        }
    }

    pub fn classify_item(&self, item: &LineItem) -> ClassifiedCode {
        self.classify(item.code(), item.description())
    }

    pub fn double_dip_pairs(&self) -> &[DoubleDipPair] {
        &self.pairs
    }

    /// Pairs checked by the given audit domain
    pub fn pairs_for(&self, domain: AuditDomain) -> impl Iterator<Item = &DoubleDipPair> {
        self.pairs.iter().filter(move |p| p.domain == domain)
    }
}

const REMOVAL: &str = r"REMOV|TEAR\s*-?\s*OUT|\bDEMO|R\s*&\s*R|REM$";

fn standard_pairs() -> Result<Vec<DoubleDipPair>, AuditError> {
    Ok(vec![
        DoubleDipPair {
            id: "carpet_pad_tear_out".into(),
            label: "Carpet and pad tear-out".into(),
            domain: AuditDomain::Flooring,
            scope: PairScope::Room,
            first: PairSide::new(&[FlooringMaterial::Carpet.pattern(), REMOVAL], &[FlooringMaterial::Pad.pattern()])?,
            second: PairSide::new(&[FlooringMaterial::Pad.pattern(), REMOVAL], &[FlooringMaterial::Carpet.pattern()])?,
            redundant: PairSideKind::Second,
            recommendation: "Carpet tear-out normally includes the pad; remove the separate pad tear-out".into(),
        },
        DoubleDipPair {
            id: "pre_hung_door_hinges".into(),
            label: "Pre-hung door and hinges".into(),
            domain: AuditDomain::GeneralRepair,
            scope: PairScope::Room,
            first: PairSide::new(&[r"PRE\s*-?\s*HUNG"], &[])?,
            second: PairSide::new(&[r"HINGE"], &[r"PRE\s*-?\s*HUNG"])?,
            redundant: PairSideKind::Second,
            recommendation: "Pre-hung door units include hinges; remove the separate hinge line".into(),
        },
        DoubleDipPair {
            id: "drywall_wallpaper_removal".into(),
            label: "Drywall and wallpaper removal".into(),
            domain: AuditDomain::GeneralRepair,
            scope: PairScope::Room,
            first: PairSide::new(
                &[r"DRYWALL|WALLBOARD|SHEETROCK|GYPSUM", REMOVAL],
                &[r"WALL\s*PAPER|WALL\s*COVERING"],
            )?,
            second: PairSide::new(&[r"WALL\s*PAPER|WALL\s*COVERING", r"REMOV|STRIP|TEAR|\bDEMO"], &[])?,
            redundant: PairSideKind::Second,
            recommendation: "Wallpaper comes off with the drywall it is attached to; remove the separate wallpaper removal".into(),
        },
        DoubleDipPair {
            id: "paint_with_primer".into(),
            label: "Paint with primer and separate primer".into(),
            domain: AuditDomain::GeneralRepair,
            scope: PairScope::Room,
            first: PairSide::new(&[r"\bPAINT", r"PRIME"], &[])?,
            second: PairSide::new(&[r"PRIME"], &[r"\bPAINT"])?,
            redundant: PairSideKind::Second,
            recommendation: "Paint line already includes priming; remove the separate primer line".into(),
        },
        DoubleDipPair {
            id: "demolition_disposal".into(),
            label: "Demolition with haul-off and separate disposal".into(),
            domain: AuditDomain::GeneralRepair,
            scope: PairScope::Claim,
            first: PairSide::new(&[r"\bDEMO|TEAR\s*-?\s*OUT", r"HAUL|DISPOS|DEBRIS"], &[])?,
            second: PairSide::new(
                &[r"HAUL\s*-?\s*OFF|DISPOSAL|DUMPSTER|DEBRIS\s*REMOV"],
                &[r"\bDEMO|TEAR\s*-?\s*OUT"],
            )?,
            redundant: PairSideKind::Second,
            recommendation: "Demolition priced with haul-off already covers disposal; remove the separate disposal charge".into(),
        },
        DoubleDipPair {
            id: "three_piece_base_cap".into(),
            label: "Three-piece base and separate base cap or shoe".into(),
            domain: AuditDomain::GeneralRepair,
            scope: PairScope::Room,
            first: PairSide::new(&[r"(?:3|THREE)\s*-?\s*PIECE\s*BASE"], &[])?,
            second: PairSide::new(&[r"BASE\s*CAP|SHOE\s*MOLD|BASE\s*SHOE"], &[r"(?:3|THREE)\s*-?\s*PIECE"])?,
            redundant: PairSideKind::Second,
            recommendation: "Three-piece base includes cap and shoe; remove the separate molding lines".into(),
        },
    ])
}
