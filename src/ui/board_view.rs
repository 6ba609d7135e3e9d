//! Plain-terminal rendering of the board.
//!
//! Columns are printed top to bottom in board order, each card showing the
//! same fields as the web card: product badges, "Name - Company", phone and
//! the assigned rep.

use std::fmt::Write;

use console::style;

use crate::board::models::{Lead, Product, Stage};
use crate::board::state::BoardState;
use crate::ui::icons::{PACKAGE, PERSON, PHONE, TROPHY};

/// Capitalize the first character, as the card title does.
fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn render_card(out: &mut String, lead: &Lead) {
    if !lead.products.is_empty() {
        let badges: Vec<String> = lead
            .products
            .iter()
            .map(|p| match p.quantity {
                Some(q) => format!("{} x{}", p.name, q),
                None => p.name.clone(),
            })
            .collect();
        let _ = writeln!(out, "    {}{}", TROPHY, style(badges.join(", ")).red());
    }

    let title = if lead.company.is_empty() {
        capitalize(&lead.name)
    } else {
        format!("{} - {}", capitalize(&lead.name), lead.company)
    };
    let _ = writeln!(out, "  {} {}", style(&title).bold(), style(format!("[{}]", lead.id)).dim());

    if !lead.phone.is_empty() {
        let _ = writeln!(out, "    {}{}", PHONE, style(&lead.phone).dim());
    }
    if let Some(rep) = lead.assigned_to.as_ref().filter(|r| !r.name.is_empty()) {
        let _ = writeln!(out, "    {}Assigned to {}", PERSON, rep.name);
    }
}

/// Render every column of `board`. Empty columns are skipped unless `show_empty`.
pub fn render_board(board: &BoardState, show_empty: bool) -> String {
    let mut out = String::new();
    for (stage, leads) in board.columns() {
        if leads.is_empty() && !show_empty {
            continue;
        }
        let heading = format!("{} ({})", stage.title(), leads.len());
        let heading = if stage == Stage::Won {
            style(heading).green().bold()
        } else if stage == Stage::Lost {
            style(heading).red().bold()
        } else {
            style(heading).cyan().bold()
        };
        let _ = writeln!(out, "{}", heading);
        let _ = writeln!(out, "{}", style("─".repeat(32)).dim());
        for lead in leads {
            render_card(&mut out, lead);
        }
        if leads.is_empty() {
            let _ = writeln!(out, "  {}", style("(no leads)").dim());
        }
        out.push('\n');
    }
    out
}

pub fn render_products(products: &[Product]) -> String {
    let mut out = String::new();
    if products.is_empty() {
        let _ = writeln!(out, "No products found.");
        return out;
    }
    for p in products {
        let mut line = format!("{}{} {}", PACKAGE, style(&p.name).bold(), style(format!("[{}]", p.id)).dim());
        if let Some(price) = p.price {
            let _ = write!(line, "  {:.2}", price);
        }
        if let Some(stock) = p.stock {
            let _ = write!(line, "  stock: {}", stock);
        }
        let _ = writeln!(out, "{}", line);
        if let Some(desc) = p.description.as_deref().filter(|d| !d.is_empty()) {
            let _ = writeln!(out, "    {}", style(desc).dim());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::models::{BoardSnapshot, ProductTag, RepRef};

    fn plain(s: &str) -> String {
        console::strip_ansi_codes(s).into_owned()
    }

    fn sample_board() -> BoardState {
        let mut ada = Lead::new("L1", "ada");
        ada.company = "Analytical Engines".into();
        ada.phone = "555-0100".into();
        ada.assigned_to = Some(RepRef {
            id: None,
            name: "Grace".into(),
        });
        let mut bob = Lead::new("L2", "bob");
        bob.products = vec![ProductTag {
            id: Some("p1".into()),
            name: "Widget".into(),
            quantity: Some(3),
        }];
        let snapshot: BoardSnapshot = [(Stage::New, vec![ada]), (Stage::Won, vec![bob])]
            .into_iter()
            .collect();
        BoardState::from_snapshot(snapshot)
    }

    #[test]
    fn test_card_fields() {
        let out = plain(&render_board(&sample_board(), true));
        assert!(out.contains("New (1)"));
        assert!(out.contains("Ada - Analytical Engines"));
        assert!(out.contains("555-0100"));
        assert!(out.contains("Assigned to Grace"));
        assert!(out.contains("Widget x3"));
    }

    #[test]
    fn test_empty_stages_toggle() {
        let board = sample_board();
        let all = plain(&render_board(&board, true));
        assert!(all.contains("Contacted (0)"));
        assert!(all.contains("(no leads)"));

        let compact = plain(&render_board(&board, false));
        assert!(!compact.contains("Contacted"));
        assert!(compact.contains("Won (1)"));
    }

    #[test]
    fn test_columns_in_board_order() {
        let out = plain(&render_board(&sample_board(), true));
        let new = out.find("New (").unwrap();
        let negotiation = out.find("Negotiation (").unwrap();
        let lost = out.find("Lost (").unwrap();
        assert!(new < negotiation && negotiation < lost);
    }

    #[test]
    fn test_render_products() {
        let products = vec![Product {
            id: "p1".into(),
            name: "Widget".into(),
            price: Some(9.5),
            stock: Some(12),
            description: Some("Blue".into()),
        }];
        let out = plain(&render_products(&products));
        assert!(out.contains("Widget"));
        assert!(out.contains("[p1]"));
        assert!(out.contains("9.50"));
        assert!(out.contains("stock: 12"));
        assert!(plain(&render_products(&[])).contains("No products found."));
    }
}
