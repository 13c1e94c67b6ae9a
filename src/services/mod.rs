// Dark Browser services
// Services provide stateless or store-backed functionality: settings, navigation, the internal scheme.

pub mod navigation;
pub mod scheme_handler;
pub mod settings_engine;
