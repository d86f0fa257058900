fn main() {
    if let Err(err) = wifi_history_lib::run() {
        eprintln!("wifi-history: {err:#}");
        std::process::exit(1);
    }
}
