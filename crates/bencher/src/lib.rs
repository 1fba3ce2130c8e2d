//! Route tables and requests shared by the benchmarks.

#[derive(Debug, Copy, Clone)]
pub struct TestCase {
    name: &'static str,
    group: TestGroup,
    table: RouteTable,
    path: &'static str,
}

impl TestCase {
    pub fn new(name: &'static str, group: TestGroup, table: RouteTable, path: &'static str) -> Self {
        Self { name, group, table, path }
    }

    pub fn small(name: &'static str, table: RouteTable, path: &'static str) -> Self {
        Self::new(name, TestGroup::Small, table, path)
    }

    pub fn large(name: &'static str, table: RouteTable, path: &'static str) -> Self {
        Self::new(name, TestGroup::Large, table, path)
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn group(&self) -> TestGroup {
        self.group
    }

    pub fn table(&self) -> &RouteTable {
        &self.table
    }

    /// The request path, query string included.
    pub fn path(&self) -> &'static str {
        self.path
    }
}

/// A list of GET route templates, registered in order.
#[derive(Debug, Copy, Clone)]
pub struct RouteTable {
    templates: &'static [&'static str],
}

impl RouteTable {
    pub const fn new(templates: &'static [&'static str]) -> Self {
        Self { templates }
    }

    pub fn templates(&self) -> &'static [&'static str] {
        self.templates
    }
}

#[derive(Clone, Copy, Debug)]
pub enum TestGroup {
    Small,
    Large,
}

impl TestGroup {
    pub fn as_str(&self) -> &'static str {
        match self {
            TestGroup::Small => "small",
            TestGroup::Large => "large",
        }
    }
}

pub static SMALL_TABLE: RouteTable = RouteTable::new(&["/", "/health", "/users/{id}"]);

pub static LARGE_TABLE: RouteTable = RouteTable::new(&[
    "/",
    "/health",
    "/metrics",
    "/login",
    "/logout",
    "/users",
    "/users/{id}",
    "/users/{id}/profile",
    "/users/{id}/settings",
    "/users/{id}/followers",
    "/users/{id}/following",
    "/users/{id}/posts",
    "/users/{id}/posts/{post_id}",
    "/users/{id}/posts/{post_id}/comments",
    "/users/{id}/posts/{post_id}/comments/{comment_id}",
    "/teams",
    "/teams/{team}",
    "/teams/{team}/members",
    "/teams/{team}/members/{member}",
    "/teams/{team}/projects",
    "/teams/{team}/projects/{project}",
    "/teams/{team}/projects/{project}/issues",
    "/teams/{team}/projects/{project}/issues/{issue}",
    "/search",
    "/search/{index}",
    "/admin",
    "/admin/audit",
    "/admin/users/{id}",
    "/static/{file}",
    "/files/{bucket}/{key}",
]);
