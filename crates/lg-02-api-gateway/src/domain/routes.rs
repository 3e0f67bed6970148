//! Route table.
//!
//! The gate and the router both resolve against this table, so what the gate
//! admits is exactly what the router serves.
//!
//! | Method | Path | Gated |
//! |--------|------|-------|
//! | GET | `/healthz` | no |
//! | GET | `/readyz` | no |
//! | POST | `/persistTransaction` | yes |
//! | GET | `/getTransactionsByChannelId` | yes |
//! | GET | `/getChannelsByTopic` | yes |

use axum::http::Method;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Healthz,
    Readyz,
    PersistTransaction,
    TransactionsByChannel,
    ChannelsByTopic,
}

impl Route {
    pub const ALL: [Route; 5] = [
        Route::Healthz,
        Route::Readyz,
        Route::PersistTransaction,
        Route::TransactionsByChannel,
        Route::ChannelsByTopic,
    ];

    /// Routes that touch the ledger index.
    pub const APPLICATION: [Route; 3] = [
        Route::PersistTransaction,
        Route::TransactionsByChannel,
        Route::ChannelsByTopic,
    ];

    pub fn path(self) -> &'static str {
        match self {
            Route::Healthz => "/healthz",
            Route::Readyz => "/readyz",
            Route::PersistTransaction => "/persistTransaction",
            Route::TransactionsByChannel => "/getTransactionsByChannelId",
            Route::ChannelsByTopic => "/getChannelsByTopic",
        }
    }

    pub fn method(self) -> Method {
        match self {
            Route::PersistTransaction => Method::POST,
            _ => Method::GET,
        }
    }

    /// Whether the route is refused until the node is ready.
    pub fn requires_ready(self) -> bool {
        Self::APPLICATION.contains(&self)
    }

    /// Short name for logs and spans.
    pub fn name(self) -> &'static str {
        match self {
            Route::Healthz => "healthz",
            Route::Readyz => "readyz",
            Route::PersistTransaction => "persist_transaction",
            Route::TransactionsByChannel => "transactions_by_channel",
            Route::ChannelsByTopic => "channels_by_topic",
        }
    }

    /// Match a request line. `HEAD` is accepted wherever `GET` is; a known
    /// path with any other method does not match.
    pub fn resolve(method: &Method, path: &str) -> Option<Route> {
        let route = Self::ALL.into_iter().find(|r| r.path() == path)?;
        let expected = route.method();
        if *method == expected || (*method == Method::HEAD && expected == Method::GET) {
            Some(route)
        } else {
            None
        }
    }

    fn usage(self) -> &'static str {
        match self {
            Route::TransactionsByChannel => "?channelId=<channel id>",
            Route::ChannelsByTopic => "?topic=<topic>",
            _ => "",
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method(), self.path())
    }
}

/// 404 body: the application routes a client can call.
pub fn not_found_message() -> String {
    let routes: Vec<String> = Route::APPLICATION
        .iter()
        .map(|r| format!("{}{}", r, r.usage()))
        .collect();
    format!("Not found. Available routes: {}", routes.join(", "))
}
