//! `robots.txt` generation.

use crate::pipeline::BuildContext;

use super::sitemap::SITEMAP_PATH;

pub const ROBOTS_PATH: &str = "/robots.txt";

pub fn render(ctx: &BuildContext<'_>) -> String {
    let build = &ctx.config.build;
    let mut out = String::from("User-agent: *\n");
    out.push_str(if build.allow_robots {
        "Disallow:\n"
    } else {
        "Disallow: /\n"
    });
    if build.make_sitemap {
        out.push_str("Sitemap: ");
        out.push_str(&ctx.links.absolute(SITEMAP_PATH));
        out.push('\n');
    }
    out
}
