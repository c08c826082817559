pub mod clock;
pub mod db_utils;
pub mod error;
pub mod http;
pub mod i18n;
pub mod money;
