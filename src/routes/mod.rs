pub mod comment;
pub mod dto;
pub mod home;
pub mod post;
pub mod user;

use actix_web::web;

/// Mounts the JSON API under `/api` and the home feed at `/`.
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .service(web::scope("/users").configure(user::config))
            .service(web::scope("/posts").configure(post::config))
            .service(web::scope("/comments").configure(comment::config)),
    );
    home::config(cfg);
}
