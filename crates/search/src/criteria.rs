//! Search requests and their normalization into typed criteria.
//!
//! Requests arrive either as query parameters ([`RawSearchRequest`], every
//! field a string) or as a JSON body ([`SearchRequestBody`]). Both normalize
//! into [`SearchCriteria`], the only shape the dispatcher accepts.
//!
//! ## Rules
//! - Blank or whitespace-only fields are absent
//! - Genre and actor lists split on [`LIST_DELIMITER`], trim each element and
//!   drop empty ones, so `"Drama,,"` is just `{"Drama"}`
//! - Fields are validated in the order `rating_from`, `rating_to`,
//!   `date_from`, `date_to`; the first failure is returned
//! - Ratings must be finite decimals; dates must be `YYYY-MM-DD`
//! - Inverted ranges are not errors, they just match nothing

use crate::error::{Result, SearchError};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Separator for multi-valued query parameters
pub const LIST_DELIMITER: char = ',';

/// Date format accepted by the release-date fields
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Untrusted search request as it arrives in a query string
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawSearchRequest {
    pub title: Option<String>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    pub rating_from: Option<String>,
    pub rating_to: Option<String>,
    pub mpaa: Option<String>,
    /// Comma-separated genre names
    pub genre: Option<String>,
    /// Comma-separated actor names
    pub actors: Option<String>,
}

/// Search request as a JSON body, with typed ratings and list fields
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchRequestBody {
    pub title: Option<String>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    pub rating_from: Option<f64>,
    pub rating_to: Option<f64>,
    pub mpaa: Option<String>,
    pub genres: Vec<String>,
    pub actors: Vec<String>,
}

/// Inclusive release-date window; either end may be open
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DateRange {
    pub fn is_set(&self) -> bool {
        self.from.is_some() || self.to.is_some()
    }
}

/// Inclusive average-rating window; either end may be open.
///
/// An explicit bound of 0 is still a bound: it restricts results to films
/// that have at least one rating.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RatingRange {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl RatingRange {
    pub fn is_set(&self) -> bool {
        self.min.is_some() || self.max.is_some()
    }
}

/// Validated search criteria. Each populated field becomes one clause.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchCriteria {
    pub title: Option<String>,
    pub release: DateRange,
    pub rating: RatingRange,
    pub content_rating: Option<String>,
    pub genres: BTreeSet<String>,
    pub actors: BTreeSet<String>,
}

impl SearchCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_release(mut self, from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        self.release = DateRange { from, to };
        self
    }

    pub fn with_rating(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.rating = RatingRange { min, max };
        self
    }

    pub fn with_content_rating(mut self, mpaa: impl Into<String>) -> Self {
        self.content_rating = Some(mpaa.into());
        self
    }

    pub fn with_genres<I, S>(mut self, genres: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.genres.extend(genres.into_iter().map(Into::into));
        self
    }

    pub fn with_actors<I, S>(mut self, actors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.actors.extend(actors.into_iter().map(Into::into));
        self
    }

    /// Number of clauses this criteria produces
    pub fn clause_count(&self) -> usize {
        [
            self.title.is_some(),
            self.release.is_set(),
            self.rating.is_set(),
            self.content_rating.is_some(),
            !self.genres.is_empty(),
            !self.actors.is_empty(),
        ]
        .into_iter()
        .filter(|&active| active)
        .count()
    }

    pub fn is_empty(&self) -> bool {
        self.clause_count() == 0
    }
}

/// Normalize a query-string request into criteria
pub fn normalize(raw: &RawSearchRequest) -> Result<SearchCriteria> {
    let rating_from = parse_rating("rating_from", raw.rating_from.as_deref())?;
    let rating_to = parse_rating("rating_to", raw.rating_to.as_deref())?;
    let date_from = parse_date("date_from", raw.date_from.as_deref())?;
    let date_to = parse_date("date_to", raw.date_to.as_deref())?;

    Ok(SearchCriteria {
        title: non_blank(raw.title.as_deref()),
        release: DateRange {
            from: date_from,
            to: date_to,
        },
        rating: RatingRange {
            min: rating_from,
            max: rating_to,
        },
        content_rating: non_blank(raw.mpaa.as_deref()),
        genres: split_list(raw.genre.as_deref().unwrap_or_default()),
        actors: split_list(raw.actors.as_deref().unwrap_or_default()),
    })
}

/// Normalize a JSON-body request into criteria
pub fn normalize_body(body: &SearchRequestBody) -> Result<SearchCriteria> {
    let rating_from = check_rating("rating_from", body.rating_from)?;
    let rating_to = check_rating("rating_to", body.rating_to)?;
    let date_from = parse_date("date_from", body.date_from.as_deref())?;
    let date_to = parse_date("date_to", body.date_to.as_deref())?;

    Ok(SearchCriteria {
        title: non_blank(body.title.as_deref()),
        release: DateRange {
            from: date_from,
            to: date_to,
        },
        rating: RatingRange {
            min: rating_from,
            max: rating_to,
        },
        content_rating: non_blank(body.mpaa.as_deref()),
        genres: clean_list(&body.genres),
        actors: clean_list(&body.actors),
    })
}

/// Split a delimited list, trimming elements and dropping empty ones
pub fn split_list(value: &str) -> BTreeSet<String> {
    value
        .split(LIST_DELIMITER)
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

fn clean_list(items: &[String]) -> BTreeSet<String> {
    items
        .iter()
        .map(|item| item.trim())
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

fn parse_rating(field: &'static str, value: Option<&str>) -> Result<Option<f64>> {
    let Some(value) = non_blank(value) else {
        return Ok(None);
    };
    let parsed: f64 = value
        .parse()
        .map_err(|_| SearchError::invalid(field, value.as_str(), "not a decimal number"))?;
    check_rating(field, Some(parsed))
}

fn check_rating(field: &'static str, value: Option<f64>) -> Result<Option<f64>> {
    match value {
        Some(rating) if !rating.is_finite() => Err(SearchError::invalid(
            field,
            rating.to_string(),
            "rating must be a finite number",
        )),
        other => Ok(other),
    }
}

fn parse_date(field: &'static str, value: Option<&str>) -> Result<Option<NaiveDate>> {
    let Some(value) = non_blank(value) else {
        return Ok(None);
    };
    NaiveDate::parse_from_str(&value, DATE_FORMAT)
        .map(Some)
        .map_err(|err| SearchError::invalid(field, value.as_str(), format!("expected YYYY-MM-DD: {err}")))
}
