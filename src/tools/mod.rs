pub mod catalog;
pub mod favorites;
pub mod notifications;
pub mod search;

pub use catalog::CatalogService;
pub use favorites::FavoritesService;
pub use notifications::NotificationService;
pub use search::PackageSearchService;
