//! Card-on-file command and query handlers.

mod add_card;
mod list_cards;
mod remove_card;

pub use add_card::{AddCardCommand, AddCardHandler};
pub use list_cards::ListCardsHandler;
pub use remove_card::{RemoveCardCommand, RemoveCardHandler};
