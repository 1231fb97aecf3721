// @generated by entity-gen. Changes are overwritten on the next run.
@% if routes %@
use axum::Router;

use crate::AppState;
@% endif %@
@%- for m in modules %@
pub mod @{ m|to_var_name }@;
@%- endfor %@
@%- if routes %@

pub fn routes() -> Router<AppState> {
    Router::new()
@%- for m in modules %@
        .merge(@{ m|to_var_name }@::router())
@%- endfor %@
}
@%- endif %@
