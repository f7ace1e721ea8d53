mod api;

pub use api::{
    DeepLResponse, HealthResponse, TranscriptionSession, TranslateParams, TranslateRequest,
    TranslateResponse, Translation,
};
