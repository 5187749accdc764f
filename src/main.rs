#[actix_web::main]
async fn main() -> std::io::Result<()> {
    chemequip_lib::run().await
}
