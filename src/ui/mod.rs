pub mod board_view;
pub mod confirm;
pub mod icons;

pub use board_view::{render_board, render_products};
pub use confirm::{parse_product_arg, prompt_won_confirmation, resolve_products};
