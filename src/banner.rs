// src/banner.rs

/// Prints the startup banner along with the API origin in use.
pub fn print_banner(base_url: &str) {
    let banner = r#"
 _   _                             _____            _  ____
| | | |_   _ _ __ ___   __ _ _ __ | ____|_   ____ _| |/ ___|___  _ __ ___  _ __ ___
| |_| | | | | '_ ` _ \ / _` | '_ \|  _| \ \ / / _` | | |   / _ \| '_ ` _ \| '_ ` _ \
|  _  | |_| | | | | | | (_| | | | | |___ \ V / (_| | | |__| (_) | | | | | | | | | | |
|_| |_|\__,_|_| |_| |_|\__,_|_| |_|_____| \_/ \__,_|_|\____\___/|_| |_| |_|_| |_| |_|

    API Testing & Evaluation Dashboard
"#;
    println!("{}", banner);
    println!("🔗 API: {}\n", base_url);
}
