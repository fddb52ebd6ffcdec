#[derive(Debug, Clone, Copy)]
pub struct LimitOffset {
    pub limit: i64,
    pub offset: i64,
}

impl Default for LimitOffset {
    fn default() -> Self {
        Self {
            limit: 50,
            offset: 0,
        }
    }
}

impl LimitOffset {
    pub const MAX_LIMIT: i64 = 500;

    /// Build from optional query parameters, clamping to sane bounds.
    pub fn from_params(limit: Option<i64>, offset: Option<i64>) -> Self {
        let default = Self::default();
        Self {
            limit: limit.unwrap_or(default.limit).clamp(1, Self::MAX_LIMIT),
            offset: offset.unwrap_or(default.offset).max(0),
        }
    }
}
