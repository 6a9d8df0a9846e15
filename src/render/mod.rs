//! Text formatting for statistics and screens.
//!
//! Formatting helpers are pure; the `render_*` functions lay a screen out
//! as plain text for the terminal.

use std::fmt::Write;

use chrono::DateTime;

use crate::listing::{PageMeta, SortFilterState, SortKey};
use crate::models::{
    CombinedRecord, Hero, ItemRecord, Match, MatchupRecord, PrimaryAttr, StatRecord, User,
};
use crate::views::{HeroDetail, HeroStatsPanel, MatchPage, TablePage, ViewError};

/// Base URL hero images are served from.
pub const CDN_BASE: &str = "https://cdn.cloudflare.steamstatic.com";

/// Placeholder for a statistic the backend did not provide.
pub const MISSING: &str = "N/A";

/// Scale maxima for stat bars.
pub const KDA_BAR_MAX: f64 = 10.0;
pub const PER_MINUTE_BAR_MAX: f64 = 900.0;

const BAR_CELLS: usize = 20;

/// `0.552` -> `"55.20%"`.
pub fn format_percent(fraction: Option<f64>) -> String {
    match fraction {
        Some(f) => format!("{:.2}%", f * 100.0),
        None => MISSING.to_string(),
    }
}

/// GPM/XPM rounded to an integer.
pub fn format_rate(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.0}", v.round()),
        None => MISSING.to_string(),
    }
}

pub fn format_ratio(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.2}", v),
        None => MISSING.to_string(),
    }
}

pub fn format_count(value: Option<u32>) -> String {
    value.map_or_else(|| MISSING.to_string(), |v| v.to_string())
}

/// Seconds as `m:ss`; zero means the duration is unknown.
pub fn format_duration(seconds: u32) -> String {
    if seconds == 0 {
        return "unknown".to_string();
    }
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

/// Unix seconds as a `YYYY-MM-DD` date.
pub fn format_match_time(unix_seconds: i64) -> String {
    if unix_seconds <= 0 {
        return "unknown".to_string();
    }
    DateTime::from_timestamp(unix_seconds, 0)
        .map(|t| t.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "invalid date".to_string())
}

/// Absolute URL of a hero image given its relative CDN path.
pub fn hero_image_url(path: &str) -> String {
    let path = path.trim().trim_end_matches('?');
    if path.is_empty() {
        return String::new();
    }
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }
    if path.starts_with('/') {
        format!("{}{}", CDN_BASE, path)
    } else {
        format!("{}/{}", CDN_BASE, path)
    }
}

pub fn attribute_label(attr: Option<PrimaryAttr>) -> &'static str {
    attr.map_or("Unknown", PrimaryAttr::label)
}

/// `K/D/A (ratio)`.
pub fn format_kda(kills: u32, deaths: u32, assists: u32) -> String {
    let ratio = (kills as f64 + assists as f64) / deaths.max(1) as f64;
    format!("{}/{}/{} ({:.2})", kills, deaths, assists, ratio)
}

/// Share of `max` that `value` covers, as a percentage clamped to [0, 100].
pub fn bar_width(value: f64, max: f64) -> f64 {
    if max <= 0.0 || !value.is_finite() {
        return 0.0;
    }
    (value / max * 100.0).clamp(0.0, 100.0)
}

fn bar(value: Option<f64>, max: f64) -> String {
    let filled = (bar_width(value.unwrap_or(0.0), max) / 100.0 * BAR_CELLS as f64).round() as usize;
    format!("[{}{}]", "#".repeat(filled), ".".repeat(BAR_CELLS - filled))
}

/// Message and retry hint shown in place of a failed screen.
pub fn render_error(error: &ViewError) -> String {
    if error.is_retryable() {
        format!("Error: {}\nRun the command again to retry.", error.user_message())
    } else {
        format!("Error: {}", error.user_message())
    }
}

fn render_page_footer(out: &mut String, meta: &PageMeta) {
    if meta.total_pages > 1 {
        let _ = writeln!(
            out,
            "\nPage {} of {} ({} total)",
            meta.page, meta.total_pages, meta.total_items
        );
    }
}

pub fn render_profile(user: &User, page: &MatchPage) -> String {
    let mut out = String::new();
    let name = if user.name.is_empty() { "Unknown player" } else { user.name.as_str() };
    let _ = writeln!(out, "=== {} ===", name);
    let _ = writeln!(out, "ID:       {}", user.id_);
    let rank = if user.rank == 0 { "not set".to_string() } else { user.rank.to_string() };
    let _ = writeln!(out, "Rank:     {}", rank);
    if !user.steam.is_empty() {
        let _ = writeln!(out, "Steam:    {}", user.steam);
    }
    if !user.avatar.is_empty() {
        let _ = writeln!(out, "Avatar:   {}", user.avatar);
    }

    let _ = writeln!(out, "\n=== Recent Matches ===");
    if page.matches.is_empty() {
        let _ = writeln!(out, "No matches found.");
        return out;
    }
    for m in &page.matches {
        let _ = writeln!(out, "{}", render_match_row(m));
    }
    render_page_footer(&mut out, &page.meta);
    out
}

fn render_match_row(m: &Match) -> String {
    format!(
        "{:<12} {:<7} {:<10} hero {:<4} {:>6}  {}",
        m.id,
        if m.win { "Win" } else { "Loss" },
        format_match_time(m.time),
        m.hero_id,
        format_duration(m.duration),
        format_kda(m.kills, m.deaths, m.assists)
    )
}

fn header_cell(label: &str, key: SortKey, listing: &SortFilterState) -> String {
    if listing.sort_key == key {
        format!("{} {}", label, listing.direction.arrow())
    } else {
        label.to_string()
    }
}

pub fn render_table(page: &TablePage) -> String {
    let mut out = String::new();
    let listing = &page.listing;
    let _ = writeln!(out, "=== Heroes (rating {}) ===", page.rating);
    if !listing.search_text.is_empty() {
        let _ = writeln!(out, "Search:   {}", listing.search_text);
    }
    let _ = writeln!(out, "Filter:   {}", listing.category.tag());
    let _ = writeln!(
        out,
        "\n{:<5} {:<22} {:>10} {:>10} {:>6} {:>6} {:>6}",
        "ID",
        header_cell("Hero", SortKey::Name, listing),
        header_cell("Win", SortKey::WinRate, listing),
        header_cell("Pres.", SortKey::Presence, listing),
        header_cell("KDA", SortKey::Kda, listing),
        header_cell("GPM", SortKey::Gpm, listing),
        header_cell("XPM", SortKey::Xpm, listing),
    );

    if page.rows.is_empty() {
        let _ = writeln!(out, "No heroes match the current filters.");
        return out;
    }
    for row in &page.rows {
        let _ = writeln!(out, "{}", render_table_row(row));
    }
    render_page_footer(&mut out, &page.meta);
    out
}

fn render_table_row(row: &CombinedRecord) -> String {
    let stats = &row.stats;
    format!(
        "{:<5} {:<22} {:>10} {:>10} {:>6} {:>6} {:>6}",
        row.id(),
        row.display_name(),
        format_percent(stats.win_rate),
        format_percent(stats.presence),
        format_ratio(stats.kda),
        format_rate(stats.gpm),
        format_rate(stats.xpm)
    )
}

pub fn render_grid(heroes: &[Hero]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "=== Heroes ({}) ===", heroes.len());
    if heroes.is_empty() {
        let _ = writeln!(out, "No heroes match the current filters.");
        return out;
    }
    for hero in heroes {
        let _ = writeln!(
            out,
            "{:<5} {:<22} {:<13} {}",
            hero.id,
            hero.display_name(),
            attribute_label(hero.primary_attr),
            hero_image_url(&hero.img)
        );
    }
    out
}

pub fn render_hero_header(hero: &Hero) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "=== {} ===", hero.display_name());
    let _ = writeln!(out, "ID:        {}", hero.id);
    let _ = writeln!(out, "Attribute: {}", attribute_label(hero.primary_attr));
    if !hero.attack_type.is_empty() {
        let _ = writeln!(out, "Attack:    {}", hero.attack_type);
    }
    if !hero.roles.is_empty() {
        let _ = writeln!(out, "Roles:     {}", hero.roles.join(", "));
    }
    let image = hero_image_url(&hero.img);
    if !image.is_empty() {
        let _ = writeln!(out, "Image:     {}", image);
    }
    out
}

pub fn render_panel(panel: &HeroStatsPanel) -> String {
    let mut out = String::new();
    match panel {
        HeroStatsPanel::Overview(None) => {
            let _ = writeln!(out, "No statistics for this hero.");
        }
        HeroStatsPanel::Overview(Some(record)) => render_overview(&mut out, record),
        HeroStatsPanel::Matchups(rows) => {
            if rows.is_empty() {
                let _ = writeln!(out, "No matchup data.");
            }
            for row in rows {
                let _ = writeln!(out, "{}", render_matchup_row(row));
            }
        }
        HeroStatsPanel::Items(rows) => {
            if rows.is_empty() {
                let _ = writeln!(out, "No item data.");
            }
            for row in rows {
                let _ = writeln!(out, "{}", render_item_row(row));
            }
        }
    }
    out
}

fn render_overview(out: &mut String, record: &StatRecord) {
    let win = record.win_rate.map(|f| f * 100.0);
    let presence = record.presence.map(|f| f * 100.0);
    let _ = writeln!(out, "Win rate  {:>8} {}", format_percent(record.win_rate), bar(win, 100.0));
    let _ = writeln!(out, "Presence  {:>8} {}", format_percent(record.presence), bar(presence, 100.0));
    let _ = writeln!(out, "KDA       {:>8} {}", format_ratio(record.kda), bar(record.kda, KDA_BAR_MAX));
    let _ = writeln!(out, "GPM       {:>8} {}", format_rate(record.gpm), bar(record.gpm, PER_MINUTE_BAR_MAX));
    let _ = writeln!(out, "XPM       {:>8} {}", format_rate(record.xpm), bar(record.xpm, PER_MINUTE_BAR_MAX));
    let _ = writeln!(out, "Matches:  {}", format_count(record.matches_count));
    let _ = writeln!(out, "Picks:    {}", format_count(record.picks_count));
    let _ = writeln!(out, "Bans:     {}", format_count(record.bans_count));
}

fn render_matchup_row(row: &MatchupRecord) -> String {
    let name = row
        .localized_name
        .clone()
        .unwrap_or_else(|| format!("Hero {}", row.hero_id));
    format!("  {:<22} {:>8} win rate", name, format_percent(row.win_rate))
}

fn render_item_row(row: &ItemRecord) -> String {
    let mut line = format!("  {:<22} {:>8} win rate", row.label(), format_percent(row.win_rate));
    if row.usage.is_some() {
        let _ = write!(line, " ({} usage)", format_percent(row.usage));
    }
    line
}

pub fn render_detail(detail: &HeroDetail) -> String {
    let mut out = String::new();
    let sections: [(&str, Vec<String>); 3] = [
        (
            "Most successful items",
            detail.items.iter().map(render_item_row).collect(),
        ),
        (
            "Strongest against",
            detail.against.iter().map(render_matchup_row).collect(),
        ),
        (
            "Best allies",
            detail.with.iter().map(render_matchup_row).collect(),
        ),
    ];
    for (title, rows) in sections {
        let _ = writeln!(out, "\n--- {} ---", title);
        if rows.is_empty() {
            let _ = writeln!(out, "  No data");
        }
        for row in rows {
            let _ = writeln!(out, "{}", row);
        }
    }
    out
}
