// HTTP handler bindings for Battlesnake API endpoints
//
// Thin wrappers that bind Rocket routes to the Bot. Requests that fail to
// deserialize are rejected by Rocket; requests that deserialize but describe an
// invalid game are rejected here with 400 before the engine sees them.

use log::warn;
use rocket::http::Status;
use rocket::serde::json::Json;
use serde_json::Value;

use sidewinder::bot::Bot;
use sidewinder::types::GameState;

/// GET / endpoint
/// Returns bot metadata and appearance configuration
#[get("/")]
pub fn index(bot: &rocket::State<Bot>) -> Json<Value> {
    Json(bot.info())
}

/// POST /start endpoint
#[post("/start", format = "json", data = "<start_req>")]
pub fn start(bot: &rocket::State<Bot>, start_req: Json<GameState>) -> Status {
    bot.start(&start_req);
    Status::Ok
}

/// POST /move endpoint
/// Called each turn to compute and return the next move
#[post("/move", format = "json", data = "<move_req>")]
pub async fn get_move(
    bot: &rocket::State<Bot>,
    move_req: Json<GameState>,
) -> Result<Json<Value>, Status> {
    match bot.get_move(&move_req).await {
        Ok(response) => Ok(Json(response)),
        Err(e) => {
            warn!("Rejecting move request for game {}: {}", move_req.game.id, e);
            Err(Status::BadRequest)
        }
    }
}

/// POST /end endpoint
#[post("/end", format = "json", data = "<end_req>")]
pub fn end(bot: &rocket::State<Bot>, end_req: Json<GameState>) -> Status {
    bot.end(&end_req);
    Status::Ok
}
