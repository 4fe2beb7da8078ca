use crate::config::Config;

/// Host name of the database URL, without credentials
fn database_host(url: &str) -> &str {
    let after_scheme = url.split_once("://").map(|(_, rest)| rest).unwrap_or(url);
    let after_auth = after_scheme.rsplit_once('@').map(|(_, rest)| rest).unwrap_or(after_scheme);
    after_auth.split('/').next().unwrap_or(after_auth)
}

pub fn print_startup_info(config: &Config, auth_configured: bool) {
    let credentials = config.cloudinary.credentials();

    println!("{}", "=".repeat(60));
    println!("🚀 Video Upload Backend Starting...");
    println!("{}", "=".repeat(60));
    println!("📊 Runtime Environment:");
    println!("  Version: {}", env!("CARGO_PKG_VERSION"));
    println!("  Platform: {} ({})", std::env::consts::OS, std::env::consts::ARCH);
    println!("  Database: {}", database_host(&config.database.url));
    println!(
        "  Cloudinary: {}",
        credentials
            .as_ref()
            .map(|c| c.cloud_name.as_str())
            .unwrap_or("credentials missing")
    );
    println!("  Upload Folder: {}", config.cloudinary.folder);
    println!("  Max File Size: {} MB", config.max_file_size / 1024 / 1024);
    println!("  Auth: {}", if auth_configured { "enabled" } else { "no verification key" });
    if config.limits.keep_alive_interval > 0 {
        println!("  Keep-alive: every {}s", config.limits.keep_alive_interval);
    }
    println!("{}", "=".repeat(60));
}
