//! `GET /` — landing page.
//!
//! The real README-rendering landing page is out of scope (spec.md §1); a
//! static placeholder is all the route needs to exist for.

pub async fn handler() -> &'static str {
	"relay speech-recognition broker\n"
}
