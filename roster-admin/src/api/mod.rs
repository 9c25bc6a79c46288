//! HTTP API handlers for roster-admin

pub mod auth;
pub mod content;
pub mod error;
pub mod health;
pub mod images;
pub mod picker;
pub mod public;
pub mod team;

pub use auth::auth_middleware;
pub use content::{get_page, list_pages, put_section};
pub use error::ApiError;
pub use health::health_routes;
pub use images::{delete_image, list_images, upload_image};
pub use picker::{close_picker, open_picker, picker_state, select_image};
pub use public::public_team;
pub use team::{
    add_member, add_section, delete_member, delete_section, get_team, load_team, member_removal,
    move_member, move_section, save_team, section_impact, update_member, update_section,
};
