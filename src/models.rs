use crate::store::CellValue;

/// Raw listing-card data as extracted from a listing page. Ephemeral;
/// promoted to a [`JobEntity`] once it survives dedup.
#[derive(Debug, Clone)]
pub struct CandidateRecord {
    pub title: String,
    pub url: String,
    /// Maximum monthly price from the card, 0 when unknown.
    pub max_monthly: u64,
    /// Capture date, `YYYY/MM/DD`.
    pub captured_on: String,
}

#[derive(Debug, Clone)]
pub struct JobEntity {
    pub title: String,
    pub url: String,
    pub max_monthly: u64,
    pub captured_on: String,
    /// Whether the detail page matched the configured keywords.
    /// True until evaluated.
    pub is_target: bool,
}

impl From<CandidateRecord> for JobEntity {
    fn from(candidate: CandidateRecord) -> Self {
        JobEntity {
            title: candidate.title,
            url: candidate.url,
            max_monthly: candidate.max_monthly,
            captured_on: candidate.captured_on,
            is_target: true,
        }
    }
}

impl JobEntity {
    // Saturating arithmetic throughout: a card price is whatever digit
    // string the site published, and an absurd figure must not abort
    // the run or wrap into garbage.
    pub fn min_monthly(&self) -> u64 {
        self.max_monthly.saturating_mul(7) / 10
    }

    pub fn avg_monthly(&self) -> u64 {
        if self.max_monthly == 0 {
            return 0;
        }
        self.max_monthly.saturating_add(self.min_monthly()) / 2
    }

    pub fn max_annual(&self) -> u64 {
        self.max_monthly.saturating_mul(12)
    }

    pub fn min_annual(&self) -> u64 {
        self.min_monthly().saturating_mul(12)
    }

    /// Builds the 20-cell B..U row for the sheet. Column A holds an
    /// index managed by the sheet itself, so the row starts at B.
    /// Blank cells are attributes this pipeline does not extract.
    pub fn to_row(&self) -> Vec<CellValue> {
        vec![
            CellValue::Text(self.captured_on.clone()), // B: capture date
            CellValue::Text(self.title.clone()),       // C: title
            CellValue::Empty,                          // D: employment type
            CellValue::Empty,                          // E: region
            CellValue::Empty,                          // F: required experience
            CellValue::Number(self.avg_monthly()),     // G: avg monthly
            CellValue::Number(self.min_annual()),      // H: min annual
            CellValue::Number(self.max_annual()),      // I: max annual
            CellValue::Number(self.min_monthly()),     // J: min monthly
            CellValue::Number(self.max_monthly),       // K: max monthly
            CellValue::Empty,                          // L: min hourly
            CellValue::Empty,                          // M: max hourly
            CellValue::Empty,                          // N..T: skill flags
            CellValue::Empty,
            CellValue::Empty,
            CellValue::Empty,
            CellValue::Empty,
            CellValue::Empty,
            CellValue::Empty,
            CellValue::Text(self.url.clone()), // U: url
        ]
    }
}
