//! Plain text rendering for the terminal

use crate::api::TournamentListing;
use ansi_term::{Colour, Style};
use arena_core::{
    common::{Tournament, UserProfile, Wallet},
    messages::{MessageKey, Notice, Severity},
    pagination::{PageControls, PageLink},
};
use std::fmt::Write as _;

/// Renders notices and listings, coloured unless disabled
#[derive(Debug, Clone, Copy)]
pub struct Renderer {
    ansi: bool,
}

impl Renderer {
    /// `ansi` turns colours on
    pub fn new(ansi: bool) -> Self {
        Self { ansi }
    }

    fn paint(&self, style: Style, text: &str) -> String {
        if self.ansi {
            style.paint(text).to_string()
        } else {
            text.to_string()
        }
    }

    fn severity_style(severity: Severity) -> Style {
        match severity {
            Severity::Error => Colour::Red.bold(),
            Severity::Success => Colour::Green.bold(),
            Severity::Info => Colour::Cyan.bold(),
            Severity::Warning => Colour::Yellow.bold(),
        }
    }

    /// A notice: title, body and hint on separate lines. Notices that
    /// never dismiss on their own are marked with `!`.
    pub fn notice(&self, notice: &Notice) -> String {
        let title = match notice.dismiss_after() {
            Some(_) => notice.title.clone(),
            None => format!("! {}", notice.title),
        };
        let mut out = self.paint(Self::severity_style(notice.severity), &title);
        let _ = write!(out, "\n{}", notice.body);
        if let Some(hint) = &notice.hint {
            let _ = write!(out, "\n{}", self.paint(Style::new().dimmed(), hint));
        }
        out
    }

    /// A page of tournaments, followed by its page selector.
    /// An empty page renders only the empty-state notice.
    pub fn tournaments(&self, listing: &TournamentListing) -> String {
        if listing.is_empty() {
            return self.notice(&MessageKey::EmptyTournaments.notice());
        }

        let mut lines: Vec<String> = listing
            .tournaments
            .iter()
            .map(|tournament| self.tournament(tournament))
            .collect();

        if let Some(controls) = listing.controls() {
            let pagination = &listing.pagination;
            lines.push(String::new());
            lines.push(self.paint(
                Style::new().dimmed(),
                &format!("Page {} of {}", pagination.page(), pagination.total_pages()),
            ));
            lines.push(self.controls(&controls));
        }
        lines.join("\n")
    }

    fn tournament(&self, tournament: &Tournament) -> String {
        let mut line = format!(
            "{} {}",
            self.paint(Style::new().dimmed(), &format!("#{}", tournament.id)),
            self.paint(Style::new().bold(), &tournament.name)
        );
        if let Some(game) = &tournament.game {
            let _ = write!(line, " ({game})");
        }
        if let Some(status) = &tournament.status {
            let _ = write!(line, " [{status}]");
        }
        if let Some(start) = &tournament.start_date {
            let _ = write!(line, " starts {start}");
        }
        if let Some(fee) = &tournament.entry_fee {
            let _ = write!(line, ", entry {fee}");
        }
        if let Some(prize) = &tournament.prize_pool {
            let _ = write!(line, ", prize {prize}");
        }
        if let Some(max) = tournament.max_participants {
            let _ = write!(line, ", up to {max} players");
        }
        line
    }

    /// `« 1 … 4 [5] 6 … 9 »`
    pub fn controls(&self, controls: &PageControls) -> String {
        let mut parts = Vec::new();
        if let Some(previous) = controls.previous {
            parts.push(format!("« {previous}"));
        }
        for link in &controls.links {
            parts.push(match link {
                PageLink::Page {
                    number,
                    current: true,
                } => self.paint(Style::new().bold(), &format!("[{number}]")),
                PageLink::Page { number, .. } => number.to_string(),
                PageLink::Gap => "…".to_string(),
            });
        }
        if let Some(next) = controls.next {
            parts.push(format!("{next} »"));
        }
        parts.join(" ")
    }

    /// The profile fields worth showing
    pub fn profile(&self, profile: &UserProfile) -> String {
        let mut lines = Vec::new();
        if let Some(username) = &profile.username {
            lines.push(format!("Username: {username}"));
        }
        if let Some(phone) = &profile.phone_number {
            lines.push(format!("Phone: {phone}"));
        }
        if let Some(level) = &profile.verification_level {
            let level = level
                .as_str()
                .map_or_else(|| level.to_string(), str::to_string);
            lines.push(format!("Verification level: {level}"));
        }
        if lines.is_empty() {
            lines.push("No profile details".to_string());
        }
        lines.join("\n")
    }

    /// The wallet balance
    pub fn wallet(&self, wallet: Option<&Wallet>) -> String {
        let Some(wallet) = wallet else {
            return "No wallet yet".to_string();
        };

        let balance = self.paint(Style::new().bold(), &wallet.balance.to_string());
        match &wallet.currency {
            Some(currency) => format!("Balance: {balance} {currency}"),
            None => format!("Balance: {balance}"),
        }
    }
}
