//! Validate query params with type checking
use super::Error;
use serde::Deserialize;
use warp::filters::BoxedFilter;
use warp::Filter as WarpFilter;

/// The parameters a replies collection accepts
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub(crate) struct RepliesQuery {
    pub(crate) page: bool,
    pub(crate) min_id: Option<String>,
    pub(crate) only_other_accounts: bool,
}

impl RepliesQuery {
    pub(crate) fn to_filter() -> BoxedFilter<(Self,)> {
        Page::to_filter()
            .and(MinId::to_filter())
            .and(OnlyOtherAccounts::to_filter())
            .and_then(|page: Page, min_id: MinId, others: OnlyOtherAccounts| async move {
                Self::parse(page, min_id, others).map_err(warp::reject::custom)
            })
            .boxed()
    }

    /// A bare `page` asks for a page; `only_other_accounts` has to be spelled out
    fn parse(page: Page, min_id: MinId, others: OnlyOtherAccounts) -> Result<Self, Error> {
        Ok(Self {
            page: match page.page.as_deref() {
                None => false,
                Some("") => true,
                Some(value) => parse_bool("page", value)?,
            },
            min_id: min_id.min_id.filter(|id| !id.is_empty()),
            only_other_accounts: match others.only_other_accounts.as_deref() {
                None | Some("") => false,
                Some(value) => parse_bool("only_other_accounts", value)?,
            },
        })
    }
}

macro_rules! make_query_type {
    ($name:tt => $parameter:tt:$type:ty) => {
        #[derive(Deserialize, Debug, Default)]
        pub(crate) struct $name {
            pub(crate) $parameter: $type,
        }
        impl $name {
            pub(crate) fn to_filter() -> BoxedFilter<(Self,)> {
                warp::query()
                    .or(warp::any().map(Self::default))
                    .unify()
                    .boxed()
            }
        }
    };
}
make_query_type!(Page => page: Option<String>);
make_query_type!(MinId => min_id: Option<String>);
make_query_type!(OnlyOtherAccounts => only_other_accounts: Option<String>);

fn parse_bool(name: &str, value: &str) -> Result<bool, Error> {
    match value {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Ok(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Ok(false),
        _ => Err(Error::MalformedInput(format!(
            "`{}` is not a boolean for `{}`",
            value, name
        ))),
    }
}

/// The query string exactly as sent, which signatures cover
pub(crate) fn raw() -> BoxedFilter<(String,)> {
    warp::query::raw()
        .or(warp::any().map(String::new))
        .unify()
        .boxed()
}

#[cfg(test)]
mod test {
    use super::*;

    async fn query(path: &str) -> Result<RepliesQuery, warp::Rejection> {
        warp::test::request()
            .path(path)
            .filter(&RepliesQuery::to_filter())
            .await
    }

    #[tokio::test]
    async fn page_is_on_when_present() -> Result<(), warp::Rejection> {
        for path in &["/?page", "/?page=", "/?page=t", "/?page=True", "/?page=TRUE", "/?page=1"] {
            assert!(query(path).await?.page, "{}", path);
        }
        for path in &["/", "/?page=0", "/?page=F", "/?page=false", "/?min_id=5"] {
            assert!(!query(path).await?.page, "{}", path);
        }
        Ok(())
    }

    #[tokio::test]
    async fn other_accounts_must_be_asked_for() -> Result<(), warp::Rejection> {
        assert!(!query("/?page=true").await?.only_other_accounts);
        assert!(!query("/?only_other_accounts").await?.only_other_accounts);
        assert!(query("/?only_other_accounts=t").await?.only_other_accounts);
        assert!(!query("/?only_other_accounts=False").await?.only_other_accounts);
        Ok(())
    }

    #[tokio::test]
    async fn empty_min_id_is_no_cursor() -> Result<(), warp::Rejection> {
        assert_eq!(query("/?page&min_id=").await?.min_id, None);
        assert_eq!(query("/?page&min_id=42").await?.min_id.as_deref(), Some("42"));
        Ok(())
    }

    #[tokio::test]
    async fn unreadable_booleans_are_malformed() {
        for path in &["/?page=maybe", "/?page=yes", "/?only_other_accounts=on"] {
            let rejection = query(path).await.expect_err("in test");
            assert!(
                matches!(rejection.find::<Error>(), Some(Error::MalformedInput(_))),
                "{}",
                path
            );
        }
    }
}
