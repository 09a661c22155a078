fn main() -> Result<(), eframe::Error> {
    env_logger::init();
    bookclub_frontend::run_frontend()
}
