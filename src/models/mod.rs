pub mod contract;
pub mod house;
pub mod maintenance;
pub mod page;
pub mod rent_payment;
pub mod review;
pub mod user;

pub use contract::{
    Contract, ContractResponse, ContractStatus, ContractTemplateData, CreateContractRequest,
    PaymentCycle, PaymentMethod, UpdateContractRequest,
};
pub use house::{CreateHouseRequest, House, HouseResponse, HouseStatus, UpdateHouseRequest};
pub use maintenance::{
    next_completed_at, CreateMaintenanceRequest, MaintenanceRequest, MaintenanceRequestResponse,
    MaintenanceStatus, UpdateMaintenanceCostRequest, UpdateMaintenanceRequest,
    UpdateMaintenanceStatusRequest,
};
pub use page::{page_window, PageResponse};
pub use rent_payment::{
    CreateRentPaymentRequest, PaymentStatus, RentPayment, RentPaymentResponse,
    UpdateRentPaymentRequest,
};
pub use review::{
    rating_in_range, CreateReviewRequest, Review, ReviewResponse, ReviewType, UpdateReviewRequest,
};
pub use user::{CreateUserRequest, UpdateUserRequest, User, UserRole};
