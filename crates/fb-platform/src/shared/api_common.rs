//! Common API types and utilities

use utoipa::{IntoParams, ToSchema};
use serde::{Deserialize, Serialize};

mod string_or_number {
    use serde::{de, Deserialize, Deserializer};

    pub fn deserialize_u32_opt<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum StringOrNum {
            Num(u32),
            Str(String),
        }

        match Option::<StringOrNum>::deserialize(deserializer)? {
            Some(StringOrNum::Num(n)) => Ok(Some(n)),
            Some(StringOrNum::Str(s)) => s.parse().map(Some).map_err(de::Error::custom),
            None => Ok(None),
        }
    }
}

/// Page query parameters. Pages are 1-based; page size defaults to 5.
#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct PageParams {
    #[serde(default, deserialize_with = "string_or_number::deserialize_u32_opt")]
    page: Option<u32>,
    #[serde(default, alias = "limit", deserialize_with = "string_or_number::deserialize_u32_opt")]
    page_size: Option<u32>,
}

impl PageParams {
    pub const DEFAULT_PAGE_SIZE: u32 = 5;

    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn page_size(&self) -> u32 {
        match self.page_size {
            Some(0) | None => Self::DEFAULT_PAGE_SIZE,
            Some(n) => n,
        }
    }

    pub fn skip(&self) -> u64 {
        (self.page() as u64 - 1) * self.page_size() as u64
    }

    pub fn limit(&self) -> i64 {
        self.page_size() as i64
    }

    /// ceil(total / pageSize)
    pub fn total_pages(&self, total: u64) -> u32 {
        total.div_ceil(self.page_size() as u64) as u32
    }
}

/// Success response with optional message
#[derive(Debug, Serialize, ToSchema)]
pub struct SuccessResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl SuccessResponse {
    pub fn ok() -> Self {
        Self { success: true, message: None }
    }

    pub fn with_message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
        }
    }
}

/// Aggregate count response
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CountResponse {
    pub total_count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(page: Option<u32>, size: Option<u32>) -> PageParams {
        let mut q = Vec::new();
        if let Some(p) = page {
            q.push(format!("page={}", p));
        }
        if let Some(s) = size {
            q.push(format!("pageSize={}", s));
        }
        serde_json::from_str(&format!(
            "{{{}}}",
            q.iter()
                .map(|kv| {
                    let (k, v) = kv.split_once('=').unwrap();
                    format!("\"{}\": {}", k, v)
                })
                .collect::<Vec<_>>()
                .join(", ")
        ))
        .unwrap()
    }

    #[test]
    fn page_defaults_to_first() {
        let p = params(None, None);
        assert_eq!(p.page(), 1);
        assert_eq!(p.page_size(), 5);
        assert_eq!(p.skip(), 0);
    }

    #[test]
    fn skip_is_offset_of_requested_page() {
        let p = params(Some(2), Some(5));
        assert_eq!(p.skip(), 5);
        assert_eq!(p.limit(), 5);
    }

    #[test]
    fn total_pages_rounds_up() {
        let p = params(None, Some(5));
        assert_eq!(p.total_pages(0), 0);
        assert_eq!(p.total_pages(5), 1);
        assert_eq!(p.total_pages(11), 3);
    }

    #[test]
    fn string_page_numbers_are_accepted() {
        let p: PageParams = serde_json::from_str(r#"{"page": "3", "pageSize": "10"}"#).unwrap();
        assert_eq!(p.page(), 3);
        assert_eq!(p.page_size(), 10);
    }
}
