mod http;
mod websocket;

pub use http::{
    get_history, get_parameters, get_room_detail, get_rooms, health_check, put_parameters,
};
pub use websocket::websocket_handler;
