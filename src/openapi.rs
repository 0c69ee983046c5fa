use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "LeaseHub API",
        version = "1.0.0",
        description = "Backend API для LeaseHub - платформы управления арендой жилья",
        contact(
            name = "LeaseHub Team",
            email = "support@leasehub.kz"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development server")
    ),
    tags(
        (name = "auth", description = "Шлюз доступа: общий пароль и токен"),
        (name = "users", description = "Пользователи (арендодатели и арендаторы)"),
        (name = "houses", description = "Дома и их статусы"),
        (name = "contracts", description = "Договоры аренды и график платежей"),
        (name = "rent-payments", description = "Арендные платежи"),
        (name = "maintenance-requests", description = "Заявки на ремонт"),
        (name = "reviews", description = "Взаимные оценки сторон договора"),
        (name = "stats", description = "Сводная статистика")
    ),
    paths(
        // Auth
        crate::api::auth::login,
        crate::api::auth::validate,
        // Houses
        crate::api::houses::search_houses,
        crate::api::houses::recommended_houses,
        crate::api::houses::get_house,
        crate::api::houses::create_house,
        crate::api::houses::update_house,
        crate::api::houses::delete_house,
        crate::api::houses::toggle_recommend,
        // Stats
        crate::api::stats::overview,
    ),
    components(
        schemas(
            // Auth
            crate::api::auth::LoginRequest,
            crate::api::auth::AuthResponse,
            // Users
            crate::models::User,
            crate::models::UserRole,
            crate::models::CreateUserRequest,
            crate::models::UpdateUserRequest,
            // Houses
            crate::models::House,
            crate::models::HouseResponse,
            crate::models::HouseStatus,
            crate::models::CreateHouseRequest,
            crate::models::UpdateHouseRequest,
            // Contracts
            crate::models::Contract,
            crate::models::ContractResponse,
            crate::models::ContractStatus,
            crate::models::ContractTemplateData,
            crate::models::PaymentCycle,
            crate::models::PaymentMethod,
            crate::models::CreateContractRequest,
            crate::models::UpdateContractRequest,
            // Rent payments
            crate::models::RentPayment,
            crate::models::RentPaymentResponse,
            crate::models::PaymentStatus,
            crate::models::CreateRentPaymentRequest,
            crate::models::UpdateRentPaymentRequest,
            // Maintenance
            crate::models::MaintenanceRequest,
            crate::models::MaintenanceRequestResponse,
            crate::models::MaintenanceStatus,
            crate::models::CreateMaintenanceRequest,
            crate::models::UpdateMaintenanceRequest,
            crate::models::UpdateMaintenanceStatusRequest,
            crate::models::UpdateMaintenanceCostRequest,
            // Reviews
            crate::models::Review,
            crate::models::ReviewResponse,
            crate::models::ReviewType,
            crate::models::CreateReviewRequest,
            crate::models::UpdateReviewRequest,
        )
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                utoipa::openapi::security::SecurityScheme::Http(
                    utoipa::openapi::security::Http::new(
                        utoipa::openapi::security::HttpAuthScheme::Bearer,
                    ),
                ),
            );
        }
    }
}
