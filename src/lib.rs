pub mod classify;
pub mod clean;
pub mod config;
pub mod dataset;
pub mod export;
pub mod gamelog;
pub mod http_cache;
pub mod http_client;
pub mod injury;
pub mod logging;
pub mod money;
pub mod record;
pub mod season;
pub mod stat_augment;
pub mod suggest;
pub mod wiki_scrape;
