//! Shared UI icons.

use console::Emoji;

pub static CHECK: Emoji<'_, '_> = Emoji("✅ ", "[OK]");
pub static CROSS: Emoji<'_, '_> = Emoji("❌ ", "[ERR]");
pub static TROPHY: Emoji<'_, '_> = Emoji("🏆 ", "*");
pub static PHONE: Emoji<'_, '_> = Emoji("📞 ", "tel: ");
pub static PERSON: Emoji<'_, '_> = Emoji("👤 ", "");
pub static PACKAGE: Emoji<'_, '_> = Emoji("📦 ", "-");
