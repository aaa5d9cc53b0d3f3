pub mod core {
    pub mod config;
    pub mod error;
    pub mod routes;
    pub mod startup;
    pub mod state;
    pub mod tracing_init;
}

pub mod models {
    pub mod api;
    pub mod bytes;
    pub mod image;
    pub mod result;
    pub mod user;
}

pub mod stores {
    pub mod image_store;
    pub mod result_store;
    pub mod user_store;
}

pub mod security {
    pub mod gate;
    pub mod password;
    pub mod token;
}

pub mod services {
    pub mod analyzer;
    pub mod reputation;
    pub mod submission;
}

pub mod api {
    pub mod analysis_client;
}

pub mod wal {
    #[allow(clippy::module_inception)]
    pub mod wal;
}

pub mod metrics {
    pub mod collector;
}

pub mod handlers {
    pub mod auth;
    pub mod fallback;
    pub mod health;
    pub mod images;
    pub mod metrics;
    pub mod users;

    #[cfg(test)]
    pub mod test_support;
}

pub mod utils {
    pub mod time;
}
