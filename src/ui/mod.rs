//! Terminal output for the `ativos` CLI
//!
//! Every message is rendered to a `String` against a [`Palette`] and printed
//! by a thin wrapper, so rendering can be checked without a terminal.

pub mod table;

pub use table::{stats_table, TableBuilder};

use owo_colors::{OwoColorize, Style};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::OnceLock;
use crate::storage::DbStats;

static PALETTE: OnceLock<Palette> = OnceLock::new();

/// Styles for the handful of things the CLI prints
#[derive(Debug, Clone)]
pub struct Palette {
    pub title: Style,
    pub ok: Style,
    pub fail: Style,
    pub notice: Style,
    pub label: Style,
}

impl Palette {
    pub fn colored() -> Self {
        Self {
            title: Style::new().cyan().bold(),
            ok: Style::new().green().bold(),
            fail: Style::new().red().bold(),
            notice: Style::new().yellow(),
            label: Style::new().dimmed(),
        }
    }

    pub fn plain() -> Self {
        Self {
            title: Style::new(),
            ok: Style::new(),
            fail: Style::new(),
            notice: Style::new(),
            label: Style::new(),
        }
    }
}

/// Palette for stdout, colourless when `console` says colours are off
pub fn palette() -> &'static Palette {
    PALETTE.get_or_init(|| {
        if console::colors_enabled() {
            Palette::colored()
        } else {
            Palette::plain()
        }
    })
}

fn field(p: &Palette, label: &str, value: impl std::fmt::Display) -> String {
    format!("  {:<9} {}", label.style(p.label), value)
}

pub fn render_serve_banner(p: &Palette, addr: SocketAddr, database: &Path) -> String {
    [
        format!("{}", "Ativos server".style(p.title)),
        field(p, "listening", format!("http://{}", addr)),
        field(p, "database", database.display()),
    ]
    .join("\n")
}

pub fn render_init_summary(p: &Palette, config_path: &Path, database: &Path) -> String {
    [
        format!("{} {}", "created".style(p.ok), config_path.display()),
        field(p, "database", database.display()),
        field(p, "next", "ativos serve"),
    ]
    .join("\n")
}

pub fn render_stats(p: &Palette, database: &Path, stats: &DbStats) -> String {
    format!(
        "{}\n{}\n{}",
        "Graph statistics".style(p.title),
        field(p, "database", database.display()),
        stats_table(stats)
    )
}

pub fn render_failure(p: &Palette, err: &anyhow::Error) -> String {
    format!("{} {:#}", "error:".style(p.fail), err)
}

pub fn render_notice(p: &Palette, message: &str) -> String {
    format!("{} {}", "note:".style(p.notice), message)
}

pub fn serve_banner(addr: SocketAddr, database: &Path) {
    println!("{}", render_serve_banner(palette(), addr, database));
}

pub fn init_summary(config_path: &Path, database: &Path) {
    println!("{}", render_init_summary(palette(), config_path, database));
}

pub fn stats(database: &Path, stats: &DbStats) {
    println!("{}", render_stats(palette(), database, stats));
}

pub fn failure(err: &anyhow::Error) {
    eprintln!("{}", render_failure(palette(), err));
}

pub fn notice(message: &str) {
    eprintln!("{}", render_notice(palette(), message));
}
