pub const LOGIN_HELP_TEXT: &str = r#"Login
=====

  login <email> <senha>   Autentica no servidor. Credenciais inválidas mostram
                          um aviso e nada é salvo.
  token <access_token>    Usa um token de acesso já emitido (busca o perfil).
  callback <query>        Retorno do login OAuth. Aceita a query inteira
                          ("?token=abc" ou "error=Acesso%20negado").
  logout                  Sai da conta e apaga access_token/user_data locais.

Ao iniciar, o painel restaura a sessão salva se existir.
"#;
