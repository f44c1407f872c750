//! Query-string helpers shared by the list endpoints.
//!
//! List filters arrive comma separated: `?ids=1,2,3&statuses=paid,unpaid`.

use crate::error::AppError;
use crate::models::{PageInput, PageQuery};

pub fn split_list(raw: Option<&str>) -> Vec<&str> {
    raw.map(|s| s.split(',').map(str::trim).filter(|s| !s.is_empty()).collect())
        .unwrap_or_default()
}

pub fn parse_ids(raw: Option<&str>, field: &str) -> Result<Vec<i64>, AppError> {
    split_list(raw)
        .into_iter()
        .enumerate()
        .map(|(i, s)| {
            s.parse::<i64>()
                .ok()
                .filter(|id| *id > 0)
                .ok_or_else(|| AppError::input(format!("{} with index {} invalid", field, i)))
        })
        .collect()
}

pub fn parse_names(raw: Option<&str>) -> Vec<String> {
    split_list(raw).into_iter().map(str::to_string).collect()
}

pub fn page(page: Option<i64>, page_size: Option<i64>) -> PageInput {
    PageQuery { page, page_size }.into()
}
