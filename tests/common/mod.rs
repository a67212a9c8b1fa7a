use chargepark_admin::config::toml_config::StoreConfig;
use chargepark_admin::RestStore;

pub fn store_for(base_url: String) -> RestStore {
    let config = StoreConfig {
        url: base_url,
        api_key: "anon-key".to_string(),
        timeout_seconds: Some(5),
        retry_attempts: Some(0),
        retry_delay_seconds: Some(0),
    };
    RestStore::new(&config).unwrap()
}
