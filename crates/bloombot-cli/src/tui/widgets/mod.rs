pub mod care_card;
pub mod help_bar;
pub mod nav_bar;
pub mod text_input;
