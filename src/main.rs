#[macro_use]
extern crate rocket;

use log::info;
use rocket::fairing::AdHoc;
use std::env;
use std::sync::Arc;
use std::time::Duration;

use sidewinder::bot::Bot;
use sidewinder::config::Config;
use sidewinder::debug_logger::DebugLogger;
use sidewinder::space::SpaceCache;

mod handler;

#[launch]
async fn rocket() -> _ {
    // Lots of web hosting services expect you to bind to the port specified by the `PORT`
    // environment variable. However, Rocket looks at the `ROCKET_PORT` environment variable.
    // If we find a value for `PORT`, we set `ROCKET_PORT` to that value.
    if let Ok(port) = env::var("PORT") {
        env::set_var("ROCKET_PORT", &port);
    }

    // We default to 'info' level logging. But if the `RUST_LOG` environment variable is set,
    // we keep that value instead.
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }

    env_logger::init();

    info!("Starting Battlesnake Server...");

    // Load configuration once at startup
    let config = Config::load_or_default();
    let cache = Arc::new(SpaceCache::new(&config.cache));
    let debug_logger = DebugLogger::new(config.debug.enabled, &config.debug.log_file_path).await;
    let sweep_interval = Duration::from_millis(config.cache.sweep_interval_ms.max(1));
    let bot = Bot::new(config, cache.clone(), debug_logger);

    rocket::build()
        .manage(bot)
        .attach(AdHoc::on_liftoff("Space Cache Sweeper", move |_| {
            let cache = cache.clone();
            Box::pin(async move {
                // Runs for the life of the process, independent of any request
                tokio::spawn(async move {
                    let mut interval = tokio::time::interval(sweep_interval);
                    loop {
                        interval.tick().await;
                        cache.sweep();
                    }
                });
            })
        }))
        .attach(AdHoc::on_response("Server ID Middleware", |_, res| {
            Box::pin(async move {
                res.set_raw_header("Server", "battlesnake/github/sidewinder");
            })
        }))
        .mount(
            "/",
            routes![handler::index, handler::start, handler::get_move, handler::end],
        )
}
