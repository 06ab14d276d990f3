//! Report CMS configuration status

use crate::config::{resolver, CmsEnv, ExecutionContext};
use crate::Blog;

fn present(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.trim().is_empty())
}

/// Lines describing which settings are present, never the secrets themselves
pub fn report(env: &CmsEnv) -> Vec<String> {
    let mut lines = vec![
        format!("MICROCMS_API_KEY exists: {}", present(&env.microcms_api_key)),
        format!(
            "MICROCMS_SERVICE_DOMAIN: {}",
            env.microcms_service_domain.as_deref().unwrap_or("<unset>")
        ),
        format!(
            "PUBLIC_MICROCMS_API_KEY exists: {}",
            present(&env.public_microcms_api_key)
        ),
        format!(
            "PUBLIC_MICROCMS_SERVICE_DOMAIN: {}",
            env.public_microcms_service_domain
                .as_deref()
                .unwrap_or("<unset>")
        ),
        format!(
            "PUBLIC_GOOGLE_ADSENSE_ID: {}",
            env.public_google_adsense_id.as_deref().unwrap_or("<unset>")
        ),
    ];

    for context in [ExecutionContext::Trusted, ExecutionContext::Untrusted] {
        match resolver::resolve(env, context) {
            Ok(credentials) => lines.push(format!(
                "{} context: ok ({})",
                context,
                credentials.service_domain.host()
            )),
            Err(err) => lines.push(format!("{} context: {}", context, err)),
        }
    }

    lines
}

/// Print the configuration report
pub fn run(blog: &Blog) {
    println!("Site: {}", blog.config.title);
    println!("Proxy URL: {}", blog.config.proxy_url());
    for line in report(&blog.env) {
        println!("  {}", line);
    }
}
