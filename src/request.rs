//! Filter incoming federation requests and answer them
mod err;
mod query;

pub use err::Error;

use self::query::RepliesQuery;
use crate::ap::{Activity, Actor, ACTIVITY_JSON};
use crate::collection::{Pager, Replies, RepliesFilters};
use crate::inbox::{self, Federator, InboundRequest, Outcome};
use crate::pool::WorkerPool;
use crate::store::Store;

use bytes::Bytes;
use serde::Serialize;
use serde_json::json;
use std::convert::Infallible;
use std::sync::Arc;
use warp::filters::BoxedFilter;
use warp::http::{HeaderMap, Method, StatusCode};
use warp::path::FullPath;
use warp::reply::{Reply, Response};
use warp::{path, Filter, Rejection};

/// Largest activity we are willing to read
const MAX_BODY_BYTES: u64 = 1024 * 1024;

/// Helper macro to match on the first of any of the provided filters
macro_rules! any_of {
    ($filter:expr, $($other_filter:expr),*) => {
        $filter$(.or($other_filter).unify())*.boxed()
    };
}

#[derive(Clone)]
pub struct Handler {
    store: Arc<dyn Store>,
    federator: Federator,
    pool: Arc<WorkerPool>,
    pager: Pager,
    instance_actor: Arc<Actor>,
    authorized_fetch: bool,
}

impl std::fmt::Debug for Handler {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "Handler({:?}, queue depth {}, authorized fetch {})",
            self.pager,
            self.pool.queue_depth(),
            self.authorized_fetch
        )
    }
}

impl Handler {
    pub fn new(
        store: Arc<dyn Store>,
        federator: Federator,
        pool: Arc<WorkerPool>,
        pager: Pager,
        instance_actor: Actor,
        authorized_fetch: bool,
    ) -> Self {
        Self {
            store,
            federator,
            pool,
            pager,
            instance_actor: Arc::new(instance_actor),
            authorized_fetch,
        }
    }

    /// Every route this server answers, with rejections turned into JSON errors
    pub fn routes(&self) -> BoxedFilter<(impl Reply,)> {
        let routes = any_of!(
            self.inbox(),
            self.replies(),
            self.local_actor(),
            self.instance_actor(),
            self.health()
        );
        #[cfg(feature = "stub_status")]
        let routes = any_of!(routes, self.status());

        routes.recover(Handler::err).boxed()
    }

    /// `POST /users/{username}/inbox`
    pub fn inbox(&self) -> BoxedFilter<(Response,)> {
        let handler = self.clone();
        path!("users" / String / "inbox")
            .and(warp::post())
            .and(warp::body::content_length_limit(MAX_BODY_BYTES))
            .and(signed_parts())
            .and(warp::body::bytes())
            .and_then(move |username: String, request: InboundRequest, body: Bytes| {
                let handler = handler.clone();
                let request = InboundRequest { body, ..request };
                async move { reject_on_err(handler.deliver(username, request).await) }
            })
            .boxed()
    }

    /// `GET /users/{username}/statuses/{id}/replies`
    pub fn replies(&self) -> BoxedFilter<(Response,)> {
        let handler = self.clone();
        path!("users" / String / "statuses" / String / "replies")
            .and(warp::get())
            .and(RepliesQuery::to_filter())
            .and(signed_parts())
            .and_then(
                move |username: String, id: String, query: RepliesQuery, request: InboundRequest| {
                    let handler = handler.clone();
                    async move {
                        reject_on_err(handler.replies_page(username, id, query, request).await)
                    }
                },
            )
            .boxed()
    }

    /// `GET /users/{username}`
    pub fn local_actor(&self) -> BoxedFilter<(Response,)> {
        let store = self.store.clone();
        path!("users" / String)
            .and(warp::get())
            .and_then(move |username: String| {
                let store = store.clone();
                async move {
                    let account = store.local_account(&username).await.map_err(Error::from);
                    reject_on_err(match account {
                        Ok(Some(account)) => Ok(activity_json(&account.to_document())),
                        Ok(None) => Err(Error::NotFound),
                        Err(e) => Err(e),
                    })
                }
            })
            .boxed()
    }

    /// `GET /actor`, the key owner for every fetch this server signs
    pub fn instance_actor(&self) -> BoxedFilter<(Response,)> {
        let mut document = self.instance_actor.to_document();
        document.kind = "Application".to_string();
        path!("actor")
            .and(warp::get())
            .map(move || activity_json(&document))
            .boxed()
    }

    pub fn health(&self) -> BoxedFilter<(Response,)> {
        path!("health")
            .and(warp::get())
            .map(|| "OK".into_response())
            .boxed()
    }

    #[cfg(feature = "stub_status")]
    pub fn status(&self) -> BoxedFilter<(Response,)> {
        let pool = self.pool.clone();
        path!("status")
            .and(warp::get())
            .map(move || {
                warp::reply::json(&json!({
                    "running": pool.running(),
                    "queue_depth": pool.queue_depth(),
                    "active_workers": pool.active_workers(),
                }))
                .into_response()
            })
            .boxed()
    }

    async fn deliver(self, username: String, request: InboundRequest) -> Result<Response, Error> {
        let activity: Activity = serde_json::from_slice(&request.body)?;
        let ctx = self
            .federator
            .handle_inbound_body(&request, &username, activity)
            .await?;
        match self.federator.authenticate(ctx, &request).await? {
            (ctx, true) => {
                log::info!("Accepted {} for {}", ctx.activity.id, ctx.receiving_account.uri);
                Ok(StatusCode::ACCEPTED.into_response())
            }
            (_, false) => Err(Error::Unauthenticated),
        }
    }

    async fn replies_page(
        self,
        username: String,
        id: String,
        query: RepliesQuery,
        request: InboundRequest,
    ) -> Result<Response, Error> {
        if self.authorized_fetch {
            self.require_signature(&request).await?;
        }
        let account = self
            .store
            .local_account(&username)
            .await?
            .ok_or(Error::NotFound)?;
        let status = self
            .store
            .local_status(&account, &id)
            .await?
            .ok_or(Error::NotFound)?;

        let replies = Replies::new(self.store.as_ref(), &status);
        let filters = RepliesFilters {
            only_other_accounts: query.only_other_accounts,
        };
        let envelope = self
            .pager
            .page(
                &replies.root(),
                query.page,
                query.min_id.as_deref(),
                &filters,
                &replies,
            )
            .await?;
        Ok(activity_json(&envelope))
    }

    async fn require_signature(&self, request: &InboundRequest) -> Result<(), Error> {
        match self.federator.authenticator().authenticate(request).await {
            Ok(Outcome::Authenticated { actor, .. }) => {
                log::debug!("{} fetched {}", actor.uri, request.path);
                Ok(())
            }
            Ok(Outcome::Rejected(_)) | Err(inbox::Error::MissingHeader(_)) => {
                Err(Error::Unauthenticated)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Turn any rejection into a JSON error body with a fitting status code
    pub async fn err(rejection: Rejection) -> Result<impl Reply, Infallible> {
        let (status, message) = if let Some(e) = rejection.find::<Error>() {
            e.log();
            (e.status(), e.to_string())
        } else if rejection.is_not_found() {
            (StatusCode::NOT_FOUND, Error::NotFound.to_string())
        } else if rejection.find::<warp::reject::PayloadTooLarge>().is_some() {
            (StatusCode::PAYLOAD_TOO_LARGE, "request body is too large".to_string())
        } else if rejection.find::<warp::reject::LengthRequired>().is_some() {
            (StatusCode::LENGTH_REQUIRED, "content-length is required".to_string())
        } else if rejection.find::<warp::reject::MethodNotAllowed>().is_some() {
            (StatusCode::METHOD_NOT_ALLOWED, "method not allowed".to_string())
        } else {
            log::error!("Unhandled rejection: {:?}", rejection);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Error::Internal(String::new()).to_string(),
            )
        };
        Ok(warp::reply::with_status(
            warp::reply::json(&json!({ "error": message })),
            status,
        ))
    }
}

/// The request line and headers, as signatures see them.  The body is left empty.
fn signed_parts() -> BoxedFilter<(InboundRequest,)> {
    warp::method()
        .and(warp::path::full())
        .and(query::raw())
        .and(warp::header::headers_cloned())
        .map(
            |method: Method, path: FullPath, query: String, headers: HeaderMap| {
                InboundRequest::new(method.as_str(), path.as_str(), Some(&query), headers, Bytes::new())
            },
        )
        .boxed()
}

fn activity_json<T: Serialize>(body: &T) -> Response {
    warp::reply::with_header(warp::reply::json(body), "content-type", ACTIVITY_JSON).into_response()
}

fn reject_on_err(result: Result<Response, Error>) -> Result<Response, Rejection> {
    result.map_err(warp::reject::custom)
}
