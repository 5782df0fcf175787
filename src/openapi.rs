use utoipa::OpenApi;

use crate::{api, plate};

#[derive(OpenApi)]
#[openapi(
    paths(api::health, api::plates, api::generate),
    components(schemas(
        api::GenerateRequest,
        api::DataUrlResponse,
        api::HealthResponse,
        api::PlatesIndex,
        plate::PlateStyle,
    )),
    tags(
        (name = "plategen", description = "UAE plate rendering backend API")
    )
)]
pub struct ApiDoc;
