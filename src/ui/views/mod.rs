mod character_detail;
mod character_list;

pub use character_detail::CharacterDetailView;
pub use character_list::CharacterListView;
