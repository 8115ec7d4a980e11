pub mod cover_grid;
pub mod header;
pub mod help_overlay;
pub mod log_panel;
pub mod login_prompt;
pub mod news_detail;
pub mod news_form;
pub mod news_panel;
pub mod song_list;
pub mod upload_form;
