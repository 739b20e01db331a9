//! Parser for catalog data files.
//!
//! A catalog directory holds four `::`-separated files:
//! - films.dat: filmId::title::releaseDate::country::mpaa::poster::genres::info
//! - actors.dat: actorId::name::birthDate::country::photo::info
//! - cast.dat: filmId::actorId::character
//! - comments.dat: userId::filmId::rating::text
//!
//! Dates are `YYYY-MM-DD`, genres are pipe-separated (`Drama|Crime`) and may
//! be empty. The last field of a line keeps any `::` it contains. Blank lines
//! and lines starting with `#` are skipped.

use crate::error::{CatalogError, Result};
use crate::types::*;
use chrono::NaiveDate;
use std::fmt::Display;
use std::path::Path;
use std::str::FromStr;

/// Date format used by every date column
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// A parsed films.dat line: the film and its genre names
#[derive(Debug, Clone)]
pub struct FilmRecord {
    pub film: Film,
    pub genres: Vec<String>,
}

/// A parsed cast.dat line
#[derive(Debug, Clone)]
pub struct CastRecord {
    pub film_id: FilmId,
    pub credit: Credit,
}

/// Read a data file and return its meaningful lines with 1-based line numbers
fn read_lines(path: &Path) -> Result<Vec<(usize, String)>> {
    if !path.exists() {
        return Err(CatalogError::FileNotFound {
            path: path.display().to_string(),
        });
    }
    let content = std::fs::read_to_string(path)?;

    Ok(content
        .lines()
        .enumerate()
        .map(|(idx, line)| (idx + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
        .map(|(no, line)| (no, line.to_string()))
        .collect())
}

/// Cursor over the `::`-separated fields of one line, carrying enough context
/// to produce a precise [`CatalogError::ParseError`].
struct LineFields<'a> {
    file: &'static str,
    line: usize,
    parts: std::str::SplitN<'a, &'static str>,
}

impl<'a> LineFields<'a> {
    fn new(file: &'static str, line: usize, text: &'a str, field_count: usize) -> Self {
        Self {
            file,
            line,
            parts: text.splitn(field_count, "::"),
        }
    }

    fn error(&self, reason: String) -> CatalogError {
        CatalogError::ParseError {
            file: self.file.to_string(),
            line: self.line,
            reason,
        }
    }

    fn next(&mut self, name: &str) -> Result<&'a str> {
        match self.parts.next() {
            Some(value) => Ok(value.trim()),
            None => Err(self.error(format!("Missing {}", name))),
        }
    }

    fn parse<T>(&mut self, name: &str) -> Result<T>
    where
        T: FromStr,
        T::Err: Display,
    {
        let raw = self.next(name)?;
        raw.parse()
            .map_err(|e| self.error(format!("Invalid {}: {}", name, e)))
    }

    fn date(&mut self, name: &str) -> Result<NaiveDate> {
        let raw = self.next(name)?;
        NaiveDate::parse_from_str(raw, DATE_FORMAT)
            .map_err(|e| self.error(format!("Invalid {} '{}': {}", name, raw, e)))
    }

    fn optional_date(&mut self, name: &str) -> Result<Option<NaiveDate>> {
        let raw = self.next(name)?;
        if raw.is_empty() {
            return Ok(None);
        }
        NaiveDate::parse_from_str(raw, DATE_FORMAT)
            .map(Some)
            .map_err(|e| self.error(format!("Invalid {} '{}': {}", name, raw, e)))
    }
}

/// Parse the films.dat file
pub fn parse_films(path: &Path) -> Result<Vec<FilmRecord>> {
    let mut films = Vec::new();

    for (line_no, line) in read_lines(path)? {
        let mut fields = LineFields::new("films.dat", line_no, &line, 8);

        let id = fields.parse("filmId")?;
        let title = fields.next("title")?.to_string();
        let release_date = fields.date("releaseDate")?;
        let country = fields.next("country")?.to_string();
        let mpaa = fields.next("mpaa")?.to_string();
        let poster = fields.next("poster")?.to_string();
        let genres = parse_genres(fields.next("genres")?);
        let info = fields.next("info")?.to_string();

        films.push(FilmRecord {
            film: Film {
                id,
                title,
                info,
                poster,
                release_date,
                country,
                mpaa,
            },
            genres,
        });
    }

    Ok(films)
}

/// Parse the actors.dat file
pub fn parse_actors(path: &Path) -> Result<Vec<Actor>> {
    let mut actors = Vec::new();

    for (line_no, line) in read_lines(path)? {
        let mut fields = LineFields::new("actors.dat", line_no, &line, 6);

        actors.push(Actor {
            id: fields.parse("actorId")?,
            name: fields.next("name")?.to_string(),
            birth_date: fields.optional_date("birthDate")?,
            country: fields.next("country")?.to_string(),
            photo: fields.next("photo")?.to_string(),
            info: fields.next("info")?.to_string(),
        });
    }

    Ok(actors)
}

/// Parse the cast.dat file
pub fn parse_cast(path: &Path) -> Result<Vec<CastRecord>> {
    let mut cast = Vec::new();

    for (line_no, line) in read_lines(path)? {
        let mut fields = LineFields::new("cast.dat", line_no, &line, 3);

        let film_id = fields.parse("filmId")?;
        let actor_id = fields.parse("actorId")?;
        // The character column is optional
        let character = fields.next("character").unwrap_or_default().to_string();

        cast.push(CastRecord {
            film_id,
            credit: Credit {
                actor_id,
                character,
            },
        });
    }

    Ok(cast)
}

/// Parse the comments.dat file
pub fn parse_comments(path: &Path) -> Result<Vec<Comment>> {
    let mut comments = Vec::new();

    for (line_no, line) in read_lines(path)? {
        let mut fields = LineFields::new("comments.dat", line_no, &line, 4);

        let user_id = fields.parse("userId")?;
        let film_id = fields.parse("filmId")?;
        let rating: f64 = fields.parse("rating")?;
        if !rating.is_finite() {
            return Err(fields.error(format!("Invalid rating: {}", rating)));
        }
        let text = fields.next("text").unwrap_or_default().to_string();

        comments.push(Comment {
            user_id,
            film_id,
            rating,
            text,
        });
    }

    Ok(comments)
}

/// Parse pipe-separated genre names, dropping empty entries
///
/// Example: "Drama|Crime" -> vec!["Drama", "Crime"]
fn parse_genres(s: &str) -> Vec<String> {
    s.split('|')
        .map(str::trim)
        .filter(|g| !g.is_empty())
        .map(str::to_string)
        .collect()
}
