use actix_web::cookie::{Cookie, SameSite};
use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error, HttpMessage,
};
use actix_web::{FromRequest, HttpRequest};
use futures::future::{ok, ready, Ready};
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use uuid::Uuid;

pub const SESSION_COOKIE: &str = "session_id";

/// Issues a `session_id` cookie on first contact and exposes the id to handlers
/// through the [`SessionId`] extractor.
#[derive(Clone, Default)]
pub struct SessionMiddleware;

impl<S, B> Transform<S, ServiceRequest> for SessionMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = SessionMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(SessionMiddlewareService {
            service: Rc::new(service),
        })
    }
}

pub struct SessionMiddlewareService<S> {
    service: Rc<S>,
}

fn session_from_cookie(req: &ServiceRequest) -> Option<Uuid> {
    let cookie = req.cookie(SESSION_COOKIE)?;
    match Uuid::parse_str(cookie.value()) {
        Ok(id) => Some(id),
        Err(_) => {
            log::debug!("Ignoring malformed session cookie on {}", req.path());
            None
        }
    }
}

fn session_cookie(id: Uuid) -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE, id.to_string())
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .finish()
}

impl<S, B> Service<ServiceRequest> for SessionMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();

        Box::pin(async move {
            let (session, issued) = match session_from_cookie(&req) {
                Some(id) => (id, false),
                None => (Uuid::new_v4(), true),
            };
            req.extensions_mut().insert(SessionId(session));

            let mut res = service.call(req).await?;
            if issued {
                log::info!("Started session {}", session);
                if let Err(e) = res.response_mut().add_cookie(&session_cookie(session)) {
                    log::warn!("Failed to set session cookie: {}", e);
                }
            }
            Ok(res)
        })
    }
}

/// Session of the current request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionId(pub Uuid);

impl FromRequest for SessionId {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut actix_web::dev::Payload) -> Self::Future {
        match req.extensions().get::<SessionId>() {
            Some(session) => ready(Ok(*session)),
            None => {
                log::error!("No session on request to {}; is SessionMiddleware installed?", req.path());
                ready(Err(actix_web::error::ErrorInternalServerError(
                    "session unavailable",
                )))
            }
        }
    }
}
