//! Files every new application starts with.

pub const LAYOUT_PATH: &str = "_layout.tsx";
pub const HOME_PATH: &str = "pages/index.tsx";

pub const LAYOUT_SOURCE: &str = r#"import { Outlet } from "@platform";

export default function Layout() {
  return (
    <main className="app-shell">
      <Outlet />
    </main>
  );
}
"#;

pub const HOME_SOURCE: &str = r#"import { Card, CardHeader, CardTitle, CardContent } from "@platform";

export default function Home() {
  return (
    <Card>
      <CardHeader>
        <CardTitle>Welcome</CardTitle>
      </CardHeader>
      <CardContent>Edit pages/index.tsx to get started.</CardContent>
    </Card>
  );
}
"#;

/// (path, source) pairs written into a fresh draft
pub fn scaffold_files() -> [(&'static str, &'static str); 2] {
    [(LAYOUT_PATH, LAYOUT_SOURCE), (HOME_PATH, HOME_SOURCE)]
}
