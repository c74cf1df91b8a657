/// Build-time credentials. Values come from the environment or from an
/// optional `.env` file next to Cargo.toml; missing ones compile in empty and
/// are reported by `Credentials::validate()` at boot.
const CREDENTIAL_VARS: [&str; 6] = [
    "AQUASENSE_WIFI_SSID",
    "AQUASENSE_WIFI_PASS",
    "AQUASENSE_FIREBASE_API_KEY",
    "AQUASENSE_FIREBASE_DB_URL",
    "AQUASENSE_FIREBASE_EMAIL",
    "AQUASENSE_FIREBASE_PASSWORD",
];

fn main() {
    println!("cargo:rerun-if-changed=.env");

    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            println!("cargo:warning=.env could not be parsed: {e}");
        }
    }

    for var in CREDENTIAL_VARS {
        println!("cargo:rerun-if-env-changed={var}");
        if let Ok(value) = std::env::var(var) {
            println!("cargo:rustc-env={var}={value}");
        }
    }

    if std::env::var("CARGO_CFG_TARGET_OS").as_deref() == Ok("espidf") {
        embuild::espidf::sysenv::output();
    }
}
