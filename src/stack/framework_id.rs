crate::define_id_enum! {
    /// Web/application framework identifier
    FrameworkId {
        Express => "express" : "Express",
        Fastify => "fastify" : "Fastify",
        NestJs => "nestjs" : "NestJS",
        NextJs => "nextjs" : "Next.js" | "next",
        Django => "django" : "Django",
        Flask => "flask" : "Flask",
        FastApi => "fastapi" : "FastAPI",
        Gin => "gin" : "Gin",
        Echo => "echo" : "Echo",
        Axum => "axum" : "Axum",
        ActixWeb => "actix-web" : "Actix Web" | "actix",
        SpringBoot => "spring-boot" : "Spring Boot" | "spring",
        Rails => "rails" : "Rails" | "Ruby on Rails",
        Sinatra => "sinatra" : "Sinatra",
        Laravel => "laravel" : "Laravel",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_framework_id_round_trip_names() {
        for id in FrameworkId::all_variants() {
            assert_eq!(FrameworkId::from_name(id.slug()), Some(*id));
            assert_eq!(FrameworkId::from_name(id.name()), Some(*id));
        }
    }

    #[test]
    fn test_framework_display() {
        assert_eq!(FrameworkId::NextJs.to_string(), "Next.js");
        assert_eq!(FrameworkId::ActixWeb.slug(), "actix-web");
    }
}
