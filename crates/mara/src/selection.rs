//! Security selection by keyword.

use crate::error::Result;
use crate::record::text_values;
use mara_data::DataProvider;
use mara_indicators::BASIC_FIELDS;
use polars::prelude::*;
use std::collections::BTreeSet;
use tracing::info;

/// Securities chosen for a run.
#[derive(Debug, Clone)]
pub struct SecuritySelection {
    /// Sorted, unique security codes
    pub ts_codes: Vec<String>,
    /// Listing rows of the selected securities
    pub basic_info: DataFrame,
}

impl SecuritySelection {
    /// Whether nothing matched.
    pub fn is_empty(&self) -> bool {
        self.ts_codes.is_empty()
    }
}

/// Select securities from the provider's listing.
///
/// With no keywords every listed security is selected. Otherwise a security
/// matches when its industry equals a keyword, or its code or name contains
/// one, ignoring case.
pub async fn select_securities<P: DataProvider>(
    provider: &P,
    keywords: &[String],
) -> Result<SecuritySelection> {
    let listing = provider.stock_basic(&BASIC_FIELDS).await?;
    let selection = filter_listing(listing, keywords)?;
    info!(securities = selection.ts_codes.len(), "securities selected");
    Ok(selection)
}

/// Apply keyword matching to a listing table.
pub fn filter_listing(listing: DataFrame, keywords: &[String]) -> Result<SecuritySelection> {
    if listing.height() == 0 {
        return Ok(SecuritySelection {
            ts_codes: Vec::new(),
            basic_info: listing,
        });
    }

    let keywords: Vec<String> = keywords
        .iter()
        .map(|keyword| keyword.trim())
        .filter(|keyword| !keyword.is_empty())
        .map(str::to_string)
        .collect();

    let codes = column_or_blank(&listing, "ts_code")?;
    let basic_info = if keywords.is_empty() {
        listing
    } else {
        let names = column_or_blank(&listing, "name")?;
        let industries = column_or_blank(&listing, "industry")?;
        let lowered: Vec<String> = keywords.iter().map(|k| k.to_lowercase()).collect();

        let mask: BooleanChunked = (0..listing.height())
            .map(|idx| {
                let code = codes[idx].to_lowercase();
                let name = names[idx].to_lowercase();
                keywords.iter().zip(&lowered).any(|(keyword, lower)| {
                    industries[idx] == *keyword || code.contains(lower) || name.contains(lower)
                })
            })
            .collect();
        listing.filter(&mask)?
    };

    let ts_codes: BTreeSet<String> = column_or_blank(&basic_info, "ts_code")?
        .into_iter()
        .filter(|code| !code.is_empty())
        .collect();

    Ok(SecuritySelection {
        ts_codes: ts_codes.into_iter().collect(),
        basic_info,
    })
}

fn column_or_blank(df: &DataFrame, name: &str) -> Result<Vec<String>> {
    Ok(match text_values(df, name)? {
        Some(values) => values.into_iter().map(Option::unwrap_or_default).collect(),
        None => vec![String::new(); df.height()],
    })
}
