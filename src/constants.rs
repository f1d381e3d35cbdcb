/// Header carrying the bearer API key on the REST surface.
pub const API_KEY_HEADER: &str = "X-API-Key";

/// Generic message returned to clients for any internal failure.
pub const SYSTEM_ERROR_MESSAGE: &str = "Terjadi kesalahan sistem";

pub mod keys {

    pub const PREFIX: &str = "ck_";

    pub const RANDOM_SUFFIX_LEN: usize = 24;
}

pub mod uploads {

    pub const CONCERT_IMAGE_DIR: &str = "concerts";

    pub const MUSIC_DIR: &str = "music";

    pub const PUBLIC_PREFIX: &str = "/uploads";

    pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif"];

    pub const AUDIO_EXTENSIONS: &[&str] = &["mp3"];
}

pub mod session {

    pub const USER: &str = "user";

    pub const FLASH: &str = "flash";
}
