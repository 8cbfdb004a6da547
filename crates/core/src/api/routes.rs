//! The resource tree: every exposed (method, path) pair, the single operation
//! it dispatches to, and the store capability that operation is bound to.

use serde::Serialize;

use crate::storage::Capability;

/// HTTP methods the API exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
        }
    }

    pub fn parse(method: &str) -> Option<Self> {
        match method {
            "GET" => Some(HttpMethod::Get),
            "POST" => Some(HttpMethod::Post),
            _ => None,
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One handler per operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Operation {
    CreateUser,
    GetUser,
    GetUserPayments,
    CreatePayment,
    GetPayment,
    ListPayments,
    GetRates,
    GetRatesHistory,
}

impl Operation {
    pub const ALL: [Operation; 8] = [
        Operation::CreateUser,
        Operation::GetUser,
        Operation::GetUserPayments,
        Operation::CreatePayment,
        Operation::GetPayment,
        Operation::ListPayments,
        Operation::GetRates,
        Operation::GetRatesHistory,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Operation::CreateUser => "CreateUser",
            Operation::GetUser => "GetUser",
            Operation::GetUserPayments => "GetUserPayments",
            Operation::CreatePayment => "CreatePayment",
            Operation::GetPayment => "GetPayment",
            Operation::ListPayments => "ListPayments",
            Operation::GetRates => "GetRates",
            Operation::GetRatesHistory => "GetRatesHistory",
        }
    }

    /// Store capability granted to the operation's handler.
    pub fn capability(&self) -> Capability {
        match self {
            Operation::CreateUser | Operation::CreatePayment => Capability::ReadWrite,
            Operation::GetUser
            | Operation::GetUserPayments
            | Operation::GetPayment
            | Operation::ListPayments
            | Operation::GetRates
            | Operation::GetRatesHistory => Capability::ReadOnly,
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A declared route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Route {
    pub method: HttpMethod,
    /// Path template; `{id}` segments capture a parameter.
    pub path: &'static str,
    pub operation: Operation,
    pub success_status: u16,
}

impl Route {
    const fn new(method: HttpMethod, path: &'static str, operation: Operation) -> Self {
        let success_status = match method {
            HttpMethod::Post => 201,
            HttpMethod::Get => 200,
        };
        Self {
            method,
            path,
            operation,
            success_status,
        }
    }

    pub fn capability(&self) -> Capability {
        self.operation.capability()
    }

    /// Matches `path` against the template, returning the captured parameter.
    fn match_path(&self, path: &str) -> Option<Option<String>> {
        let mut template = self.path.trim_matches('/').split('/');
        let mut actual = path.strip_prefix('/').unwrap_or(path).split('/');
        let mut param = None;

        loop {
            match (template.next(), actual.next()) {
                (None, None) => return Some(param),
                (Some(t), Some(a)) if t.starts_with('{') && t.ends_with('}') => {
                    if a.is_empty() {
                        return None;
                    }
                    param = Some(a.to_string());
                }
                (Some(t), Some(a)) if t == a => {}
                _ => return None,
            }
        }
    }
}

/// Every exposed route. Anything else is answered with 404.
pub const ROUTES: [Route; 8] = [
    Route::new(HttpMethod::Post, "/users", Operation::CreateUser),
    Route::new(HttpMethod::Get, "/users/{id}", Operation::GetUser),
    Route::new(HttpMethod::Get, "/users/{id}/payments", Operation::GetUserPayments),
    Route::new(HttpMethod::Post, "/payments", Operation::CreatePayment),
    Route::new(HttpMethod::Get, "/payments", Operation::ListPayments),
    Route::new(HttpMethod::Get, "/payments/{id}", Operation::GetPayment),
    Route::new(HttpMethod::Get, "/rates", Operation::GetRates),
    Route::new(HttpMethod::Get, "/rates/history", Operation::GetRatesHistory),
];

/// A request matched to its route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRoute {
    pub route: Route,
    pub id: Option<String>,
}

impl ResolvedRoute {
    pub fn operation(&self) -> Operation {
        self.route.operation
    }
}

/// Finds the route for a (method, path) pair.
pub fn resolve(method: &str, path: &str) -> Option<ResolvedRoute> {
    let method = HttpMethod::parse(method)?;

    ROUTES
        .iter()
        .filter(|route| route.method == method)
        .find_map(|route| {
            route.match_path(path).map(|id| ResolvedRoute { route: *route, id })
        })
}

/// The route declared for an operation.
pub fn route_for(operation: Operation) -> Option<&'static Route> {
    ROUTES.iter().find(|route| route.operation == operation)
}
