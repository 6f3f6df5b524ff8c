use actix_web::dev::Server;
use actix_web::{web, App, HttpServer};
use std::net::TcpListener;

use crate::auth::AuthService;
use crate::logger::LoggerMiddleware;
use crate::middleware::JwtMiddleware;
use crate::routes::{
    create_user, current_user, health_check, login, polka_webhook, refresh, revoke, update_user,
};

pub fn run(listener: TcpListener, auth: AuthService) -> Result<Server, std::io::Error> {
    let codec = auth.codec().clone();
    let auth = web::Data::new(auth);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(LoggerMiddleware)
            .app_data(auth.clone())
            .service(
                web::scope("/api")
                    // Public routes
                    .route("/healthz", web::get().to(health_check))
                    .route("/login", web::post().to(login))
                    // PUT checks the bearer access token itself
                    .service(
                        web::resource("/users")
                            .route(web::post().to(create_user))
                            .route(web::put().to(update_user)),
                    )
                    // Routes authenticated by the token they carry
                    .route("/refresh", web::post().to(refresh))
                    .route("/revoke", web::post().to(revoke))
                    .route("/polka/webhooks", web::post().to(polka_webhook))
                    // Protected by the JWT middleware
                    .service(
                        web::resource("/me")
                            .wrap(JwtMiddleware::new(codec.clone()))
                            .route(web::get().to(current_user)),
                    ),
            )
    })
    .listen(listener)?
    .run();

    Ok(server)
}
